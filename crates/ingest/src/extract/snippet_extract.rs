//! Raw-text snippet extraction (no file bytes involved): chunking strategy
//! is chosen purely from input size.

use crate::artifact::{Chunk, ChunkType};
use crate::error::IngestError;
use crate::extract::base_summary_fields;

use super::ArtifactSummary;

const SINGLE_CHUNK_MAX: usize = 500;
const PARAGRAPH_SPLIT_MAX: usize = 2000;
const WINDOW_SIZE: usize = 500;
const WINDOW_OVERLAP: usize = 100;
const MAX_CHUNKS: usize = 500;

/// Where a snippet came from. `AiAgent` carries through extra identifying
/// fields the caller supplies out of band (see [`extract_snippet_with_meta`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetSource {
    UserInput,
    AiAgent,
    Paste,
    Api,
}

impl SnippetSource {
    fn as_str(&self) -> &'static str {
        match self {
            SnippetSource::UserInput => "user_input",
            SnippetSource::AiAgent => "ai_agent",
            SnippetSource::Paste => "paste",
            SnippetSource::Api => "api",
        }
    }
}

/// Out-of-band identifying fields attached to the artifact summary when the
/// snippet source is [`SnippetSource::AiAgent`].
#[derive(Debug, Clone, Default)]
pub struct AgentMeta {
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub conversation_id: Option<String>,
    pub turn_number: Option<u32>,
}

fn split_sentences(text: &str) -> Vec<String> {
    text.split_inclusive(['.', '!', '?'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn sliding_window(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    let step = WINDOW_SIZE - WINDOW_OVERLAP;
    let mut out = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + WINDOW_SIZE).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        if !window.trim().is_empty() {
            out.push(window);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    out
}

fn chunk_by_size(text: &str) -> Vec<String> {
    let len = text.chars().count();
    if len <= SINGLE_CHUNK_MAX {
        return vec![text.to_string()];
    }
    if len <= PARAGRAPH_SPLIT_MAX {
        let paragraphs: Vec<&str> = text.split("\n\n").map(|p| p.trim()).filter(|p| !p.is_empty()).collect();
        if paragraphs.len() > 1 {
            return paragraphs.into_iter().map(String::from).collect();
        }
        return split_sentences(text);
    }
    sliding_window(text)
}

/// Extract a raw-text snippet with no agent metadata attached. Equivalent
/// to calling [`extract_snippet_with_meta`] with `source = UserInput`.
pub fn extract_snippet(
    text: &str,
    source: SnippetSource,
    artifact_id: &str,
    tenant_id: &str,
) -> Result<(ArtifactSummary, Vec<Chunk>), IngestError> {
    extract_snippet_with_meta(text, source, AgentMeta::default(), artifact_id, tenant_id)
}

/// Extract a raw-text snippet, attaching `agent_meta` to the artifact
/// summary's type metadata when `source` is [`SnippetSource::AiAgent`].
pub fn extract_snippet_with_meta(
    text: &str,
    source: SnippetSource,
    agent_meta: AgentMeta,
    artifact_id: &str,
    tenant_id: &str,
) -> Result<(ArtifactSummary, Vec<Chunk>), IngestError> {
    let mut summary = base_summary_fields(text);
    summary.summary = Some(text.chars().take(500).collect());

    let mut type_metadata = serde_json::json!({ "source": source.as_str() });
    if source == SnippetSource::AiAgent {
        type_metadata["agent_id"] = serde_json::json!(agent_meta.agent_id);
        type_metadata["agent_name"] = serde_json::json!(agent_meta.agent_name);
        type_metadata["conversation_id"] = serde_json::json!(agent_meta.conversation_id);
        type_metadata["turn_number"] = serde_json::json!(agent_meta.turn_number);
    }
    summary.type_metadata = type_metadata;

    let pieces = chunk_by_size(text);
    let mut chunks = Vec::with_capacity(pieces.len().min(MAX_CHUNKS));
    for (i, piece) in pieces.into_iter().take(MAX_CHUNKS).enumerate() {
        let piece_meta = base_summary_fields(&piece);
        let mut chunk = Chunk::new(artifact_id, tenant_id, i as u32, ChunkType::SnippetChunk);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_single_chunk() {
        let text = "a".repeat(500);
        let (_, chunks) = extract_snippet(&text, SnippetSource::UserInput, "a1", "t1").unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn over_threshold_splits() {
        let text = "a".repeat(501);
        let (_, chunks) = extract_snippet(&text, SnippetSource::UserInput, "a1", "t1").unwrap();
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn large_text_uses_sliding_window() {
        let text = "word ".repeat(500);
        let (_, chunks) = extract_snippet(&text, SnippetSource::UserInput, "a1", "t1").unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.len() <= MAX_CHUNKS);
    }
}
