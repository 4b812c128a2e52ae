//! Image captioning + OCR: a `VisionProvider`/`OcrEngine` trait pair so a
//! process can plug in a real model server, plus [`process_image`] which
//! wires either collaborator into a caption embedding via [`crate::document::embed`].
//!
//! Both collaborators fail soft: a missing provider produces `None` fields
//! rather than an error, matching the rest of this crate's fallback-to-stub
//! posture.

use async_trait::async_trait;

use crate::document::embed;
use crate::{SemanticConfig, SemanticError};

const CAPTION_PROMPT: &str =
    "Describe this image concisely in one sentence, then list 3-5 key visual tags (objects, places, concepts). Format: CAPTION: [sentence]. TAGS: [tag1, tag2, ...]";
const CAPTION_EMBED_MAX_CHARS: usize = 8_000;

/// Generates a natural-language caption for an image. Implementations that
/// have no model installed should return `Ok(None)` rather than an error.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    async fn caption(&self, image_bytes: &[u8]) -> Result<Option<String>, SemanticError>;
}

/// Extracts any text rendered in an image. Implementations with no OCR
/// engine available should return `Ok(None)`.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, image_bytes: &[u8]) -> Result<Option<String>, SemanticError>;
}

/// Deterministic vision provider used when no real model server is
/// configured (tests, offline development). Produces a caption derived
/// from the byte length so results are stable across runs of the same
/// input, mirroring [`crate::stub`]'s approach to text embeddings.
pub struct StubVisionProvider;

#[async_trait]
impl VisionProvider for StubVisionProvider {
    async fn caption(&self, image_bytes: &[u8]) -> Result<Option<String>, SemanticError> {
        if image_bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!(
            "CAPTION: An image of {} bytes. TAGS: Image, Content, Media",
            image_bytes.len()
        )))
    }
}

/// Always reports no OCR engine available.
pub struct NullOcrEngine;

#[async_trait]
impl OcrEngine for NullOcrEngine {
    async fn extract_text(&self, _image_bytes: &[u8]) -> Result<Option<String>, SemanticError> {
        Ok(None)
    }
}

/// Split a `"CAPTION: <sentence>. TAGS: <a, b, c>"` response into its
/// caption and lowercased tag list. Falls back to treating the whole
/// response as the caption and heuristically pulling 3-5 capitalized
/// tokens as tags when the markers are absent.
fn parse_caption_response(response: &str) -> (String, Vec<String>) {
    if let Some(tags_idx) = response.find("TAGS:") {
        if let Some(caption_idx) = response.find("CAPTION:") {
            let caption = response[caption_idx + "CAPTION:".len()..tags_idx]
                .trim()
                .trim_end_matches('.')
                .to_string();
            let labels: Vec<String> = response[tags_idx + "TAGS:".len()..]
                .split(',')
                .map(|t| t.trim().trim_end_matches('.').to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
            return (caption, labels);
        }
    }

    let caption = response.trim().to_string();
    let mut labels: Vec<String> = response
        .split_whitespace()
        .filter(|w| w.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) && w.len() > 2)
        .map(|w| w.trim_matches(|c: char| ".,;:!?".contains(c)).to_lowercase())
        .collect();
    labels.sort();
    labels.dedup();
    labels.truncate(5);
    (caption, labels)
}

/// Output of [`process_image`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageCaptionResult {
    pub caption: Option<String>,
    pub image_labels: Vec<String>,
    pub ocr_text: Option<String>,
    pub caption_embedding: Option<Vec<f32>>,
}

/// Caption and/or OCR an image, then embed `concat(caption, ocr)` (space
/// joined, truncated to 8,000 chars) through the same text embedding model
/// used for documents. Never fails on a missing provider: that collaborator's
/// fields are simply left `None`.
pub async fn process_image(
    image_bytes: &[u8],
    vision: &dyn VisionProvider,
    ocr: &dyn OcrEngine,
    want_caption: bool,
    want_ocr: bool,
    embed_cfg: &SemanticConfig,
) -> Result<ImageCaptionResult, SemanticError> {
    let mut result = ImageCaptionResult::default();

    if want_caption {
        if let Some(raw) = vision.caption(image_bytes).await? {
            let (caption, labels) = parse_caption_response(&raw);
            result.caption = Some(caption);
            result.image_labels = labels;
        }
    }

    if want_ocr {
        result.ocr_text = ocr.extract_text(image_bytes).await?.filter(|t| !t.trim().is_empty());
    }

    let combined: String = [result.caption.as_deref(), result.ocr_text.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let combined: String = combined.chars().take(CAPTION_EMBED_MAX_CHARS).collect();

    if !combined.trim().is_empty() {
        let vector = embed(&combined, embed_cfg).await?;
        if !vector.is_empty() {
            result.caption_embedding = Some(vector);
        }
    }

    Ok(result)
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

    #[test]
    fn parses_structured_caption_response() {
        let (caption, labels) =
            parse_caption_response("CAPTION: A dog in a park. TAGS: dog, park, grass");
        assert_eq!(caption, "A dog in a park");
        assert_eq!(labels, vec!["dog", "park", "grass"]);
    }

    #[test]
    fn falls_back_to_capitalized_token_heuristic() {
        let (caption, labels) = parse_caption_response("A Photo of Mount Everest at Sunrise");
        assert_eq!(caption, "A Photo of Mount Everest at Sunrise");
        assert!(labels.contains(&"photo".to_string()));
        assert!(labels.len() <= 5);
    }

    #[tokio::test]
    async fn process_image_with_stub_vision_and_no_ocr() {
        let result = process_image(
            b"fake-image-bytes",
            &StubVisionProvider,
            &NullOcrEngine,
            true,
            true,
            &stub_cfg(),
        )
        .await
        .unwrap();

        assert!(result.caption.is_some());
        assert!(result.ocr_text.is_none());
        assert!(result.caption_embedding.is_some());
    }

    #[tokio::test]
    async fn process_image_skips_caption_when_not_requested() {
        let result = process_image(
            b"fake-image-bytes",
            &StubVisionProvider,
            &NullOcrEngine,
            false,
            false,
            &stub_cfg(),
        )
        .await
        .unwrap();

        assert!(result.caption.is_none());
        assert!(result.ocr_text.is_none());
        assert!(result.caption_embedding.is_none());
    }

    #[tokio::test]
    async fn empty_image_bytes_produce_no_caption() {
        let result = process_image(b"", &StubVisionProvider, &NullOcrEngine, true, false, &stub_cfg())
            .await
            .unwrap();
        assert!(result.caption.is_none());
    }
}
