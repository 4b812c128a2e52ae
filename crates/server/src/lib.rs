//! UCFP Server - HTTP REST API for the contextual document search engine
//!
//! This crate provides a production-ready HTTP server that exposes the
//! ingestion, search and suggestion pipeline via a REST API. It supports:
//!
//! - **Ingestion**: File upload and raw text snippet ingestion into
//!   tenant-scoped artifacts and chunks.
//! - **Search**: Keyword, semantic and hybrid contextual search over
//!   artifacts and chunks.
//! - **Suggestions**: Prefix-based autocomplete over tenant query history.
//! - **Health & Metrics**: Liveness/readiness probes and Prometheus-compatible metrics.
//!
//! # Features
//!
//! - **Authentication**: API key-based authentication with rate limiting
//! - **Middleware**: Compression, CORS, request ID tracking, structured logging
//! - **Configuration**: Environment variable and file-based configuration
//! - **Error Handling**: Comprehensive error responses with error codes
//! - **Graceful Shutdown**: Proper signal handling for production deployments
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints (No Authentication)
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Protected Endpoints (API Key Required)
//!
//! - `GET /api/v1/search` - Contextual artifact/chunk search
//! - `GET /api/v1/suggest` - Autocomplete suggestions
//! - `POST /api/v1/ingest/file` - Ingest an uploaded file
//! - `POST /api/v1/ingest/snippet` - Ingest a raw text snippet
//! - `PUT /api/v1/artifacts/{id}` - Update an artifact (emits a reindex event)
//! - `DELETE /api/v1/artifacts/{id}` - Delete an artifact (emits a reindex event)
//! - `GET /api/v1/metadata` - Server metadata

pub mod config;
pub mod error;
pub mod ingestion;
pub mod middleware;
pub mod reindex;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
