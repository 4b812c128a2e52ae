//! Persistence-facing schema types shared by every stage downstream of
//! ingestion: the parent [`Artifact`] record and its child [`Chunk`] records.
//!
//! These are plain data types; nothing here touches a store. The `index`
//! crate's backend persists their serialized form, and `matcher` reads them
//! back for search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of artifact this is, independent of its MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ArtifactKind {
    File,
    Text,
    Url,
    Database,
    Api,
}

/// File-kind label used to pick an extractor and to tag the artifact for
/// filtering; distinct from `ArtifactKind` (a `File` artifact can be any of
/// these; a `Text` artifact is always `FileKind::Snippet` or `FileKind::Text`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FileKind {
    Pdf,
    Csv,
    Image,
    Text,
    Snippet,
}

/// One uploaded document or text snippet, owned by a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub tenant_id: String,
    pub owner_id: String,
    pub uri: String,
    pub name: String,
    pub description: Option<String>,
    pub mime_type: String,
    pub kind: ArtifactKind,
    pub file_kind: FileKind,
    pub byte_size: u64,
    pub tags: Vec<String>,

    pub vendor: Option<String>,
    pub currency: Option<String>,
    pub amounts_cents: Vec<i64>,
    pub entities: Vec<String>,
    pub keywords: Vec<String>,
    pub dates: Vec<String>,

    pub summary: Option<String>,
    pub text_embedding: Option<Vec<f32>>,
    pub image_embedding: Option<Vec<f32>>,
    pub image_labels: Vec<String>,
    pub ocr_text: Option<String>,

    pub type_metadata: serde_json::Value,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a chunk was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ChunkType {
    Page,
    Row,
    Paragraph,
    SnippetChunk,
    Image,
}

/// Deep-link locators attached to a chunk so a search hit can point back at
/// the exact page/row/region it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkLocator {
    pub page_number: Option<u32>,
    pub row_index: Option<u32>,
    pub col_index: Option<u32>,
    pub bbox: Option<[f32; 4]>,
}

/// One unit of searchable content belonging to an [`Artifact`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub artifact_id: String,
    pub tenant_id: String,
    pub chunk_index: u32,
    pub chunk_type: ChunkType,

    pub text: Option<String>,
    pub ocr_text: Option<String>,
    pub caption: Option<String>,
    pub image_description: Option<String>,
    pub image_labels: Vec<String>,
    pub caption_embedding: Option<Vec<f32>>,
    pub text_embedding: Option<Vec<f32>>,

    pub locator: ChunkLocator,

    pub vendor: Option<String>,
    pub currency: Option<String>,
    pub amounts_cents: Vec<i64>,
    pub entities: Vec<String>,
    pub keywords: Vec<String>,
    pub dates: Vec<String>,

    pub text_normalized: Option<String>,
    pub ocr_text_normalized: Option<String>,
    pub searchable_text: Option<String>,
}

impl Chunk {
    /// A fresh, empty chunk at `chunk_index` for `artifact_id`/`tenant_id`,
    /// ready for a caller to fill in type-specific fields.
    pub fn new(artifact_id: impl Into<String>, tenant_id: impl Into<String>, chunk_index: u32, chunk_type: ChunkType) -> Self {
        Chunk {
            artifact_id: artifact_id.into(),
            tenant_id: tenant_id.into(),
            chunk_index,
            chunk_type,
            text: None,
            ocr_text: None,
            caption: None,
            image_description: None,
            image_labels: Vec::new(),
            caption_embedding: None,
            text_embedding: None,
            locator: ChunkLocator::default(),
            vendor: None,
            currency: None,
            amounts_cents: Vec::new(),
            entities: Vec::new(),
            keywords: Vec::new(),
            dates: Vec::new(),
            text_normalized: None,
            ocr_text_normalized: None,
            searchable_text: None,
        }
    }
}

/// Everything a [`crate::extract`] extractor produces for one artifact:
/// the fields destined for the `Artifact` row, plus its ordered chunks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactSummary {
    pub summary: Option<String>,
    pub vendor: Option<String>,
    pub currency: Option<String>,
    pub amounts_cents: Vec<i64>,
    pub entities: Vec<String>,
    pub keywords: Vec<String>,
    pub dates: Vec<String>,
    pub image_labels: Vec<String>,
    pub ocr_text: Option<String>,
    pub type_metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chunk_has_empty_collections() {
        let c = Chunk::new("a1", "t1", 0, ChunkType::Page);
        assert!(c.entities.is_empty());
        assert!(c.searchable_text.is_none());
        assert_eq!(c.chunk_index, 0);
    }
}
