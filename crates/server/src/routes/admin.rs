//! Admin endpoints: artifact update/delete, each emitting a reindex event
//! per the "Update / Delete APIs" surface (C10 consumers).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ServerError, ServerResult};
use crate::reindex::{reindex_artifact, ReindexEvent};
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct UpdateArtifactBody {
    pub tenant_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// `PUT /api/v1/artifacts/{id}` — apply a field-level patch to an artifact
/// and emit the reindex event the changed fields imply.
pub async fn update_artifact(
    State(state): State<Arc<ServerState>>,
    Path(artifact_id): Path<String>,
    Json(body): Json<UpdateArtifactBody>,
) -> ServerResult<impl IntoResponse> {
    let mut artifact = state
        .document_store()
        .get_artifact(&body.tenant_id, &artifact_id)
        .ok_or(ServerError::NotFound)?;

    let mut changed_fields = Vec::new();
    if let Some(name) = body.name {
        artifact.name = name;
        changed_fields.push("name".to_string());
    }
    if let Some(description) = body.description {
        artifact.description = Some(description);
        changed_fields.push("description".to_string());
    }
    if let Some(tags) = body.tags {
        artifact.tags = tags;
        changed_fields.push("tags".to_string());
    }

    state.document_store().put_artifact(&artifact)?;

    if !changed_fields.is_empty() {
        reindex_artifact(&state, &body.tenant_id, &artifact_id, ReindexEvent::Updated { changed_fields }).await?;
    }

    Ok(Json(json!({ "artifact_id": artifact_id, "status": "updated" })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteArtifactQuery {
    pub tenant_id: String,
}

/// `DELETE /api/v1/artifacts/{id}?tenant_id=...`
pub async fn delete_artifact(
    State(state): State<Arc<ServerState>>,
    Path(artifact_id): Path<String>,
    Query(params): Query<DeleteArtifactQuery>,
) -> ServerResult<impl IntoResponse> {
    reindex_artifact(&state, &params.tenant_id, &artifact_id, ReindexEvent::Deleted).await?;
    Ok(Json(json!({ "artifact_id": artifact_id, "status": "deleted" })))
}
