//! # UCFP Index
//!
//! Backend-agnostic key-value storage for the document search pipeline.
//!
//! ## Core Features
//!
//! - **Pluggable Backends**: storage is abstracted behind the [`IndexBackend`]
//!   trait (put/get/delete/batch-put/scan by key). Out of the box:
//!   - An in-memory `HashMap`-based backend for tests and small deployments.
//!   - A redb backend for persistent, on-disk storage (enabled via the
//!     `backend-redb` feature).
//! - **Suggestion Index**: [`SuggestionIndex`] builds five per-tenant,
//!   lexicographically ordered term sets (filenames, vendors, entities,
//!   keywords, content terms) over any [`IndexBackend`] and serves
//!   prefix-based autocomplete.
//!
//! Artifacts and chunks themselves are stored directly as serialized bytes
//! keyed by id (see `matcher::DocumentStore`), also over an [`IndexBackend`] -
//! this crate only owns the storage abstraction and the suggestion index, not
//! the document schema.

mod backend;
mod suggestion;

#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use backend::{BackendConfig, InMemoryBackend, IndexBackend};
pub use suggestion::{Suggestion, SuggestionIndex};

use thiserror::Error;

/// Custom error type
#[derive(Error, Debug, Clone)]
pub enum IndexError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}
