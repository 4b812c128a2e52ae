//! Document/chunk-level embedding operations layered over [`crate::semanticize`]
//! and [`crate::semanticize_batch`]: single-shot embed, aligned batch embed,
//! deterministic sliding-window chunking, and a combined "embed a whole
//! document, chunking it first if it's large" helper.
//!
//! None of this duplicates the ONNX/API/stub provider logic — it only
//! decides what text goes in and how many calls come back out.

use crate::{semanticize, semanticize_batch, SemanticConfig, SemanticError};

const EMBED_MAX_CHARS: usize = 8_000;
const TAIL_CHUNK_MIN_LEN: usize = 50;

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Embed a single piece of text, truncated to 8,000 characters. An empty
/// input returns an empty vector without calling the provider.
pub async fn embed(text: &str, cfg: &SemanticConfig) -> Result<Vec<f32>, SemanticError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let truncated = truncate_chars(text, EMBED_MAX_CHARS);
    let embedding = semanticize("text", truncated, cfg).await?;
    Ok(embedding.vector)
}

/// Embed many texts, preserving input order and length. A provider in
/// batch-capable mode sends everything in one call; in any mode, a
/// per-item failure degrades to an empty vector at that index rather than
/// failing the whole batch.
pub async fn embed_batch(texts: &[&str], cfg: &SemanticConfig) -> Result<Vec<Vec<f32>>, SemanticError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let docs: Vec<(String, &str)> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| (i.to_string(), truncate_chars(t, EMBED_MAX_CHARS)))
        .collect();

    match semanticize_batch(&docs, cfg).await {
        Ok(embeddings) => Ok(embeddings.into_iter().map(|e| e.vector).collect()),
        Err(_) => {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(embed(text, cfg).await.unwrap_or_default());
            }
            Ok(out)
        }
    }
}

/// One sliding-window chunk of a larger text, with its dense index and
/// character offset into the source.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub index: usize,
    pub offset: usize,
    pub text: String,
}

/// Deterministic sliding window over `text`: windows of `size` characters,
/// stepping by `size - overlap`. A trailing window shorter than 50
/// characters is dropped rather than emitted as a near-empty chunk.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<TextChunk> {
    if text.is_empty() || size == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let step = size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut index = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        if piece.chars().count() >= TAIL_CHUNK_MIN_LEN || start == 0 {
            chunks.push(TextChunk {
                index,
                offset: start,
                text: piece,
            });
            index += 1;
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// A document vector plus, when the source text was large enough to be
/// chunked, the per-chunk vectors aligned to [`chunk_text`]'s output.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEmbedding {
    pub vector: Vec<f32>,
    pub chunks: Option<Vec<(TextChunk, Vec<f32>)>>,
}

/// Embed a whole document. If `text` is at most `size` characters, or
/// `chunk_if_large` is false, this is equivalent to [`embed`]. Otherwise
/// the text is split via [`chunk_text`] (using `size` as both window and
/// overlap base, overlap fixed at 10% of `size`), each chunk is embedded in
/// one batch call, and the first chunk's vector stands in as the document
/// vector.
pub async fn embed_document(
    text: &str,
    chunk_if_large: bool,
    size: usize,
    cfg: &SemanticConfig,
) -> Result<DocumentEmbedding, SemanticError> {
    if text.chars().count() <= size || !chunk_if_large {
        return Ok(DocumentEmbedding {
            vector: embed(text, cfg).await?,
            chunks: None,
        });
    }

    let overlap = size / 10;
    let pieces = chunk_text(text, size, overlap);
    if pieces.is_empty() {
        return Ok(DocumentEmbedding {
            vector: embed(text, cfg).await?,
            chunks: None,
        });
    }

    let texts: Vec<&str> = pieces.iter().map(|p| p.text.as_str()).collect();
    let vectors = embed_batch(&texts, cfg).await?;
    let first = vectors.first().cloned().unwrap_or_default();
    let chunks: Vec<(TextChunk, Vec<f32>)> = pieces.into_iter().zip(vectors).collect();

    Ok(DocumentEmbedding {
        vector: first,
        chunks: Some(chunks),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_cfg() -> SemanticConfig {
        SemanticConfig {
            tier: "fast".into(),
            ..SemanticConfig::default()
        }
    }

    #[tokio::test]
    async fn embed_empty_text_returns_empty_vector() {
        let vec = embed("", &stub_cfg()).await.unwrap();
        assert!(vec.is_empty());
    }

    #[tokio::test]
    async fn embed_batch_preserves_order_and_length() {
        let texts = ["alpha", "beta", "gamma"];
        let vectors = embed_batch(&texts, &stub_cfg()).await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| !v.is_empty()));
    }

    #[test]
    fn chunk_text_drops_short_tail() {
        let text = "a".repeat(520);
        let chunks = chunk_text(&text, 500, 100);
        assert!(chunks.iter().all(|c| c.text.chars().count() >= TAIL_CHUNK_MIN_LEN || c.index == 0));
    }

    #[test]
    fn chunk_text_dense_indices() {
        let text = "x".repeat(1300);
        let chunks = chunk_text(&text, 500, 100);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
        }
    }

    #[tokio::test]
    async fn embed_document_short_text_has_no_chunks() {
        let result = embed_document("short text", true, 500, &stub_cfg()).await.unwrap();
        assert!(result.chunks.is_none());
        assert!(!result.vector.is_empty());
    }

    #[tokio::test]
    async fn embed_document_large_text_chunks_and_embeds_each() {
        let text = "word ".repeat(300);
        let result = embed_document(&text, true, 500, &stub_cfg()).await.unwrap();
        let chunks = result.chunks.expect("expected chunking for large text");
        assert!(chunks.len() > 1);
        assert_eq!(result.vector, chunks[0].1);
    }

    #[tokio::test]
    async fn embed_document_without_chunk_if_large_embeds_whole_text() {
        let text = "word ".repeat(300);
        let result = embed_document(&text, false, 500, &stub_cfg()).await.unwrap();
        assert!(result.chunks.is_none());
    }
}
