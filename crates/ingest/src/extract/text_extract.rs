//! Text-file extraction: plain text, markdown, JSON, INI, YAML, and XML,
//! distinguished by filename suffix. Chunking falls back through
//! paragraph -> line -> fixed-window splitting, whichever produces more
//! than one usable chunk first.

use crate::artifact::{Chunk, ChunkType};
use crate::error::IngestError;
use crate::extract::base_summary_fields;

use super::ArtifactSummary;

const MAX_CHUNKS: usize = 500;
const FIXED_WINDOW: usize = 500;

fn suffix_of(filename: Option<&str>) -> String {
    filename
        .and_then(|f| f.rsplit('.').next())
        .unwrap_or("")
        .to_lowercase()
}

fn json_schema_metadata(text: &str) -> Option<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    match &value {
        serde_json::Value::Object(map) => Some(serde_json::json!({
            "json_keys": map.keys().cloned().collect::<Vec<_>>(),
        })),
        serde_json::Value::Array(items) => Some(serde_json::json!({
            "json_array_length": items.len(),
        })),
        _ => None,
    }
}

fn ini_section_names(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.starts_with('[') && line.ends_with(']') && line.len() > 2 {
                Some(line[1..line.len() - 1].to_string())
            } else {
                None
            }
        })
        .collect()
}

/// Split text into chunks, trying paragraph splits first, then lines, then
/// fixed-size windows, stopping at whichever level yields more than one
/// non-empty piece. Always capped at [`MAX_CHUNKS`].
fn chunk_text(text: &str) -> Vec<String> {
    let paragraphs: Vec<&str> = text.split("\n\n").map(|p| p.trim()).filter(|p| !p.is_empty()).collect();
    if paragraphs.len() > 1 {
        return paragraphs.into_iter().take(MAX_CHUNKS).map(String::from).collect();
    }

    let lines: Vec<&str> = text.lines().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
    if lines.len() > 1 {
        return lines.into_iter().take(MAX_CHUNKS).map(String::from).collect();
    }

    text.chars()
        .collect::<Vec<char>>()
        .chunks(FIXED_WINDOW)
        .take(MAX_CHUNKS)
        .map(|w| w.iter().collect::<String>())
        .filter(|w| !w.trim().is_empty())
        .collect()
}

/// Extract `text` into an [`ArtifactSummary`] and paragraph/line/window
/// chunks, with JSON/INI schema metadata attached when the suffix matches.
pub fn extract_text(
    text: &str,
    filename: Option<&str>,
    artifact_id: &str,
    tenant_id: &str,
) -> Result<(ArtifactSummary, Vec<Chunk>), IngestError> {
    let suffix = suffix_of(filename);

    let mut type_metadata = serde_json::json!({ "sub_type": suffix });
    if suffix == "json" {
        if let Some(schema) = json_schema_metadata(text) {
            if let (Some(obj), Some(extra)) = (type_metadata.as_object_mut(), schema.as_object()) {
                obj.extend(extra.clone());
            }
        }
    } else if suffix == "ini" {
        let sections = ini_section_names(text);
        type_metadata["ini_sections"] = serde_json::json!(sections);
    }

    let mut summary = base_summary_fields(text);
    summary.summary = Some(text.chars().take(500).collect());
    summary.type_metadata = type_metadata;

    let pieces = chunk_text(text);
    let mut chunks = Vec::with_capacity(pieces.len());
    for (i, piece) in pieces.into_iter().enumerate() {
        let piece_meta = base_summary_fields(&piece);
        let mut chunk = Chunk::new(artifact_id, tenant_id, i as u32, ChunkType::Paragraph);
        chunk.text = Some(piece);
        chunk.vendor = piece_meta.vendor;
        chunk.currency = piece_meta.currency;
        chunk.amounts_cents = piece_meta.amounts_cents;
        chunk.entities = piece_meta.entities;
        chunk.keywords = piece_meta.keywords;
        chunk.dates = piece_meta.dates;
        chunks.push(chunk);
    }

    Ok((summary, chunks))
}
