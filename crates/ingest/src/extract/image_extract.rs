//! Image extraction: a single chunk carrying dimensions/format metadata.
//! Caption, OCR text, and richer image labels are filled in later by the
//! vision pipeline (`semantic::vision`), not here.

use image::GenericImageView;

use crate::artifact::{Chunk, ChunkType};
use crate::error::IngestError;

use super::ArtifactSummary;

/// Decode `bytes` as an image and produce a single [`ChunkType::Image`]
/// chunk. A decode failure degrades to a minimal summary with no chunks.
pub fn extract_image(
    bytes: &[u8],
    artifact_id: &str,
    tenant_id: &str,
) -> Result<(ArtifactSummary, Vec<Chunk>), IngestError> {
    let format = image::guess_format(bytes).ok();
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(_) => {
            let summary = ArtifactSummary {
                type_metadata: serde_json::json!({ "decode_failed": true }),
                ..Default::default()
            };
            return Ok((summary, Vec::new()));
        }
    };

    let (width, height) = img.dimensions();
    let color_type = format!("{:?}", img.color());
    let aspect_ratio = if height != 0 {
        width as f64 / height as f64
    } else {
        0.0
    };

    let chunk = Chunk::new(artifact_id, tenant_id, 0, ChunkType::Image);

    let summary = ArtifactSummary {
        summary: Some(format!("Image {width}x{height} ({color_type})")),
        type_metadata: serde_json::json!({
            "width": width,
            "height": height,
            "color_type": color_type,
            "format": format.map(|f| format!("{f:?}")),
            "aspect_ratio": aspect_ratio,
        }),
        ..Default::default()
    };

    Ok((summary, vec![chunk]))
}
