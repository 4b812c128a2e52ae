//! Error types produced by the `ingest` crate.
//!
//! The primary error surface is [`IngestError`], which is used for all
//! request-time failures during ingest normalization and validation.
use thiserror::Error;

/// Errors that can occur during ingest normalization and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("invalid utf-8 payload: {0}")]
    InvalidUtf8(String),
}
