//! Ingest endpoints (C7): accept an uploaded file or a raw text snippet and
//! hand it to the ingestion orchestrator.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};
use crate::ingestion::{self, IngestFileRequest, IngestSnippetRequest};
use crate::state::ServerState;

/// Base64-encoded file upload. A dedicated multipart endpoint is future
/// work; this is the JSON-friendly shape for now.
#[derive(Debug, Deserialize)]
pub struct IngestFileBody {
    pub filename: String,
    pub mime_type: String,
    pub tenant_id: String,
    pub owner_id: String,
    pub content_base64: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct IngestSnippetBody {
    pub text: String,
    pub title: String,
    pub tenant_id: String,
    pub owner_id: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_source() -> String {
    "user_input".to_string()
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub artifact_id: String,
}

/// `POST /api/v1/ingest/file`
pub async fn ingest_file(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<IngestFileBody>,
) -> ServerResult<impl IntoResponse> {
    let bytes = BASE64
        .decode(body.content_base64.as_bytes())
        .map_err(|e| ServerError::BadRequest(format!("invalid base64 content: {e}")))?;

    let artifact = ingestion::ingest_file(
        &state,
        IngestFileRequest {
            bytes,
            filename: body.filename,
            mime_type: body.mime_type,
            tenant_id: body.tenant_id,
            owner_id: body.owner_id,
            tags: body.tags,
        },
    )
    .await?;

    Ok(Json(IngestResponse { artifact_id: artifact.id }))
}

/// `POST /api/v1/ingest/snippet`
pub async fn ingest_snippet(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<IngestSnippetBody>,
) -> ServerResult<impl IntoResponse> {
    let artifact = ingestion::ingest_snippet(
        &state,
        IngestSnippetRequest {
            text: body.text,
            title: body.title,
            tenant_id: body.tenant_id,
            owner_id: body.owner_id,
            source: body.source,
            tags: body.tags,
        },
    )
    .await?;

    Ok(Json(IngestResponse { artifact_id: artifact.id }))
}
