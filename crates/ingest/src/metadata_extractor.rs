//! Pull structured metadata out of extracted document text: vendor name,
//! keywords, and entities, plus small per-source-type helpers for CSV rows
//! and image chunks that don't have a vendor label to look for.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::structured_extract::extract_capitalized_entities;
use crate::vendor::VendorNormalizer;

/// Metadata recovered from a document's extracted text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetadata {
    pub vendor: Option<String>,
    pub keywords: Vec<String>,
    pub entities: Vec<String>,
}

static VENDOR_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^\s*(?:from|vendor|company|supplier|provider|seller|sold\s+by|billed\s+by|issued\s+by)\s*[:\-]\s*(.+)$",
    )
    .unwrap()
});

static LEGAL_SUFFIX_ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z&.,' ]{1,60}?\s+(?:Inc|LLC|Ltd|Corp|Co|GmbH|S\.A\.|PLC)\.?)\b")
        .unwrap()
});

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "this", "that", "have", "has", "are", "was", "were",
    "will", "your", "you", "our", "their", "its",
];

/// Extract vendor, keywords, and entities from `text`. Vendor detection
/// tries an explicit label line first ("Vendor: Acme Corp"), then falls
/// back to the first legal-suffix-bearing span ("Acme Corp.") found
/// anywhere in the text.
pub fn extract_metadata(text: &str) -> ExtractedMetadata {
    let vendor = VENDOR_LABEL_RE
        .captures(text)
        .map(|c| VendorNormalizer::normalize(c[1].trim()))
        .or_else(|| {
            LEGAL_SUFFIX_ENTITY_RE
                .captures(text)
                .map(|c| VendorNormalizer::normalize(&c[1]))
        });

    let entities: Vec<String> = extract_capitalized_entities(text)
        .into_iter()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    let keywords = extract_keywords(text, 20);

    ExtractedMetadata {
        vendor,
        keywords,
        entities,
    }
}

/// Frequency-ranked keyword extraction: lowercase word tokens of length >=
/// 4, stop words dropped, ties broken by first appearance, capped at `limit`.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for raw in text.split(|c: char| !c.is_alphanumeric()) {
        if raw.chars().count() < 4 {
            continue;
        }
        let word = raw.to_lowercase();
        if STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        match counts.iter_mut().find(|(w, _)| *w == word) {
            Some((_, count)) => *count += 1,
            None => counts.push((word, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(limit).map(|(w, _)| w).collect()
}

/// Per-row metadata for a CSV record: no vendor label to look for, so this
/// just runs keyword extraction over the row's joined cell values.
pub fn extract_csv_row_metadata(cells: &[String]) -> ExtractedMetadata {
    let joined = cells.join(" ");
    ExtractedMetadata {
        vendor: None,
        keywords: extract_keywords(&joined, 10),
        entities: extract_capitalized_entities(&joined),
    }
}

/// Per-chunk metadata for an image: derived entirely from caption/OCR text
/// handed in by the caller (see the `semantic` crate's caption pipeline),
/// since an image has no body text of its own to label a vendor from.
pub fn extract_image_chunk_metadata(caption_and_ocr_text: &str) -> ExtractedMetadata {
    let mut meta = extract_metadata(caption_and_ocr_text);
    meta.vendor = None;
    meta
}
