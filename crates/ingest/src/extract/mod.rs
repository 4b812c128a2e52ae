//! Type-specific content extraction: one module per supported file kind,
//! each converting raw bytes (or raw text, for snippets) into an
//! [`ArtifactSummary`] plus a dense, zero-indexed list of [`Chunk`]s.
//!
//! Extraction never aborts ingest: a library failure inside one extractor
//! is caught and turned into a minimal summary with no chunks, per the
//! orchestrator's error-handling discipline (see [`crate::IngestError`]).

mod csv_extract;
mod image_extract;
mod pdf_extract;
mod snippet_extract;
mod text_extract;

pub use csv_extract::extract_csv;
pub use image_extract::extract_image;
pub use pdf_extract::extract_pdf;
pub use snippet_extract::{extract_snippet, SnippetSource};
pub use text_extract::extract_text;

use crate::artifact::{ArtifactSummary, Chunk, FileKind};
use crate::error::IngestError;
use crate::metadata_extractor::extract_metadata;
use crate::structured_extract::{extract_dates, extract_money};

/// The raw content handed to an extractor: binary formats get bytes, text
/// formats (and snippets) get an already-decoded string.
pub enum ExtractInput<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
}

/// Pick and run the extractor for `kind`, given `artifact_id`/`tenant_id`
/// to stamp onto every produced chunk.
pub fn extract(
    kind: FileKind,
    input: ExtractInput<'_>,
    filename: Option<&str>,
    artifact_id: &str,
    tenant_id: &str,
) -> Result<(ArtifactSummary, Vec<Chunk>), IngestError> {
    match (kind, input) {
        (FileKind::Pdf, ExtractInput::Bytes(bytes)) => extract_pdf(bytes, artifact_id, tenant_id),
        (FileKind::Csv, ExtractInput::Bytes(bytes)) => extract_csv(bytes, artifact_id, tenant_id),
        (FileKind::Image, ExtractInput::Bytes(bytes)) => {
            extract_image(bytes, artifact_id, tenant_id)
        }
        (FileKind::Text, ExtractInput::Bytes(bytes)) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| IngestError::InvalidUtf8(e.to_string()))?;
            extract_text(text, filename, artifact_id, tenant_id)
        }
        (FileKind::Text, ExtractInput::Text(text)) => {
            extract_text(text, filename, artifact_id, tenant_id)
        }
        (FileKind::Snippet, ExtractInput::Text(text)) => {
            extract_snippet(text, SnippetSource::UserInput, artifact_id, tenant_id)
        }
        (FileKind::Snippet, ExtractInput::Bytes(bytes)) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| IngestError::InvalidUtf8(e.to_string()))?;
            extract_snippet(text, SnippetSource::UserInput, artifact_id, tenant_id)
        }
        (FileKind::Pdf | FileKind::Csv | FileKind::Image, ExtractInput::Text(_)) => {
            Err(IngestError::InvalidMetadata(
                "binary file kind given text input".to_string(),
            ))
        }
    }
}

/// Shared structured-field pass applied by every extractor on top of its
/// own per-kind parsing: money, dates, and the vendor/keyword/entity pass
/// from [`extract_metadata`].
pub(crate) fn base_summary_fields(text: &str) -> ArtifactSummary {
    let meta = extract_metadata(text);
    let money = extract_money(text);
    let currency = money.first().map(|m| m.currency.clone());
    let amounts_cents: Vec<i64> = money.iter().map(|m| (m.amount * 100.0).round() as i64).collect();

    ArtifactSummary {
        summary: None,
        vendor: meta.vendor,
        currency,
        amounts_cents,
        entities: meta.entities,
        keywords: meta.keywords,
        dates: extract_dates(text),
        image_labels: Vec::new(),
        ocr_text: None,
        type_metadata: serde_json::Value::Null,
    }
}
