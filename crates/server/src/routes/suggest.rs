//! Suggest endpoint (C8): autocomplete over the suggestion index.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::ServerResult;
use crate::state::ServerState;

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    pub prefix: String,
    pub tenant_id: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// `GET /api/v1/suggest?prefix=...&tenant_id=...&limit=...`
pub async fn suggest(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<SuggestQuery>,
) -> ServerResult<impl IntoResponse> {
    let limit = if params.limit == 0 {
        state.config.suggestion.default_limit
    } else {
        params.limit
    };
    let suggestions = state.suggestion_index().suggest(&params.tenant_id, &params.prefix, limit)?;
    Ok(Json(suggestions))
}
