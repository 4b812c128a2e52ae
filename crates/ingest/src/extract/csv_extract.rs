//! CSV extraction: one chunk per row (capped), plus column/amount summary
//! stats across the whole file.

use csv::ReaderBuilder;

use crate::artifact::{Chunk, ChunkLocator, ChunkType};
use crate::error::IngestError;
use crate::metadata_extractor::extract_csv_row_metadata;
use crate::structured_extract::{extract_dates, extract_money};

use super::ArtifactSummary;

const MAX_ROW_CHUNKS: usize = 1000;
const MAX_AMOUNTS: usize = 100;
const MAX_ENTITIES: usize = 50;
const MAX_KEYWORDS: usize = 100;
const MAX_DATES: usize = 50;

/// Parse `bytes` as CSV, capturing header columns, an amount min/max
/// summary, and up to [`MAX_ROW_CHUNKS`] row chunks serialized as
/// `"col: value | col: value"`.
pub fn extract_csv(
    bytes: &[u8],
    artifact_id: &str,
    tenant_id: &str,
) -> Result<(ArtifactSummary, Vec<Chunk>), IngestError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .map(|h| h.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();

    let mut chunks = Vec::new();
    let mut row_count = 0usize;
    let mut all_amounts: Vec<f64> = Vec::new();
    let mut entities: Vec<String> = Vec::new();
    let mut keywords: Vec<String> = Vec::new();
    let mut dates: Vec<String> = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(_) => continue,
        };
        row_count += 1;

        let cells: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        let row_text = headers
            .iter()
            .zip(cells.iter())
            .map(|(col, val)| format!("{col}: {val}"))
            .collect::<Vec<_>>()
            .join(" | ");

        for m in extract_money(&row_text) {
            if all_amounts.len() < MAX_AMOUNTS {
                all_amounts.push(m.amount);
            }
        }
        if dates.len() < MAX_DATES {
            dates.extend(extract_dates(&row_text));
            dates.truncate(MAX_DATES);
        }
        let row_meta = extract_csv_row_metadata(&cells);
        if keywords.len() < MAX_KEYWORDS {
            keywords.extend(row_meta.keywords.clone());
            keywords.truncate(MAX_KEYWORDS);
        }
        if entities.len() < MAX_ENTITIES {
            for entity in &row_meta.entities {
                if entities.len() >= MAX_ENTITIES {
                    break;
                }
                if !entities.contains(entity) {
                    entities.push(entity.clone());
                }
            }
        }

        if chunks.len() >= MAX_ROW_CHUNKS {
            continue;
        }
        let mut chunk = Chunk::new(artifact_id, tenant_id, chunks.len() as u32, ChunkType::Row);
        chunk.text = Some(row_text);
        chunk.locator = ChunkLocator {
            row_index: Some((i + 1) as u32),
            ..Default::default()
        };
        chunk.keywords = row_meta.keywords;
        chunks.push(chunk);
    }

    let min_amount = all_amounts.iter().cloned().fold(None, |acc: Option<f64>, x| {
        Some(acc.map_or(x, |a| a.min(x)))
    });
    let max_amount = all_amounts.iter().cloned().fold(None, |acc: Option<f64>, x| {
        Some(acc.map_or(x, |a| a.max(x)))
    });

    let summary = ArtifactSummary {
        summary: Some(format!("CSV with {row_count} rows, columns: {}", headers.join(", "))),
        vendor: None,
        currency: None,
        amounts_cents: all_amounts.iter().map(|a| (a * 100.0).round() as i64).collect(),
        entities,
        keywords,
        dates,
        image_labels: Vec::new(),
        ocr_text: None,
        type_metadata: serde_json::json!({
            "row_count": row_count,
            "columns": headers,
            "min_amount": min_amount,
            "max_amount": max_amount,
        }),
    };

    Ok((summary, chunks))
}
