//! API route handlers
//!
//! This module contains all HTTP endpoint implementations for the UCFP server.
//! Routes are organized by functionality:
//!
//! - `health`: Health checks, readiness, and metrics
//! - `ingest`: Artifact ingestion from file upload or text snippet
//! - `search`: Contextual artifact/chunk search
//! - `suggest`: Autocomplete suggestions
//! - `admin`: Artifact update/delete, each emitting a reindex event

pub mod admin;
pub mod health;
pub mod ingest;
pub mod search;
pub mod suggest;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Returns server information including version and available endpoints.
/// This is the root endpoint (GET /) and requires no authentication.
///
/// # Response
///
/// ```json
/// {
///   "name": "UCFP Server",
///   "version": "0.1.0",
///   "api_version": "v1",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "UCFP Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/search",
            "/api/v1/suggest",
            "/api/v1/ingest/file",
            "/api/v1/ingest/snippet",
            "/api/v1/artifacts/{id}",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
