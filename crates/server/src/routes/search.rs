//! Search endpoint (C9): embeds the query when the requested mode needs a
//! vector, then delegates routing/scoring/ranking to `matcher::SearchService`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use matcher::{SearchMode, SearchRequest, SearchResponse};
use serde::Deserialize;

use crate::error::ServerResult;
use crate::state::ServerState;

fn default_limit() -> usize {
    10
}

fn default_mode() -> SearchMode {
    SearchMode::Auto
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub tenant_id: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_mode")]
    pub mode: SearchMode,
}

/// `GET /api/v1/search?query=...&tenant_id=...&limit=...&mode=...`
pub async fn search(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<SearchQuery>,
) -> ServerResult<impl IntoResponse> {
    let needs_embedding = !matches!(params.mode, SearchMode::Keyword);
    let query_embedding = if needs_embedding {
        semantic::embed(&params.query, state.semantic_cfg.as_ref()).await.ok().filter(|v| !v.is_empty())
    } else {
        None
    };

    let req = SearchRequest {
        query: params.query,
        tenant_id: params.tenant_id,
        limit: params.limit,
        mode: params.mode,
    };

    let response: SearchResponse = state.search_service().search(&req, query_embedding.as_deref());
    Ok(Json(response))
}
