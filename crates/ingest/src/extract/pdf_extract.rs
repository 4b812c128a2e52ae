//! PDF extraction: one chunk per non-empty page.

use pdf_extract::extract_text_by_pages_from_mem;

use crate::artifact::{Chunk, ChunkLocator, ChunkType};
use crate::error::IngestError;
use crate::extract::base_summary_fields;

use super::ArtifactSummary;

/// Extract page text from `bytes` and build one [`Chunk`] per non-empty
/// page. A whole-document parse failure degrades to a minimal summary with
/// no chunks rather than aborting ingest; per-page text gaps from the
/// underlying parser still surface as an empty page rather than failing
/// the document.
pub fn extract_pdf(
    bytes: &[u8],
    artifact_id: &str,
    tenant_id: &str,
) -> Result<(ArtifactSummary, Vec<Chunk>), IngestError> {
    let pages = match extract_text_by_pages_from_mem(bytes) {
        Ok(pages) => pages,
        Err(_) => {
            let mut summary = ArtifactSummary::default();
            summary.type_metadata = serde_json::json!({ "pdf_pages": 0, "extraction_failed": true });
            return Ok((summary, Vec::new()));
        }
    };

    let mut chunks = Vec::with_capacity(pages.len());
    let mut full_text = String::new();
    let mut chunk_index = 0u32;

    for (i, page_text) in pages.iter().enumerate() {
        let trimmed = page_text.trim();
        if trimmed.is_empty() {
            continue;
        }
        full_text.push_str(trimmed);
        full_text.push(' ');

        let mut chunk_summary = base_summary_fields(trimmed);
        let mut chunk = Chunk::new(artifact_id, tenant_id, chunk_index, ChunkType::Page);
        chunk.text = Some(trimmed.to_string());
        chunk.locator = ChunkLocator {
            page_number: Some((i + 1) as u32),
            ..Default::default()
        };
        chunk.vendor = chunk_summary.vendor.take();
        chunk.currency = chunk_summary.currency.clone();
        chunk.amounts_cents = chunk_summary.amounts_cents.clone();
        chunk.entities = chunk_summary.entities.clone();
        chunk.keywords = chunk_summary.keywords.clone();
        chunk.dates = chunk_summary.dates.clone();
        chunks.push(chunk);
        chunk_index += 1;
    }

    let mut summary = base_summary_fields(&full_text);
    summary.summary = Some(full_text.chars().take(500).collect());
    summary.type_metadata = serde_json::json!({ "pdf_pages": pages.len() });

    Ok((summary, chunks))
}
