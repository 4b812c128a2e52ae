//! Ingestion orchestrator (C7): picks an extractor, embeds artifact and
//! chunk text, and persists both through [`ServerState`]'s document store.
//!
//! The artifact write always precedes the chunk write: a reader must never
//! observe a chunk whose parent row doesn't exist yet.

use canonical::{create_searchable_text, normalize_query, tokenize_for_search};
use chrono::Utc;
use ingest::{extract, extract_image_chunk_metadata, Artifact, ArtifactKind, Chunk, ExtractInput, FileKind};
use semantic::{embed, embed_batch, process_image, NullOcrEngine, StubVisionProvider};
use tracing::warn;

use crate::error::ServerResult;
use crate::state::ServerState;

/// Input to [`ingest_file`].
#[derive(Debug, Clone)]
pub struct IngestFileRequest {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub tenant_id: String,
    pub owner_id: String,
    pub tags: Vec<String>,
}

/// Input to [`ingest_snippet`].
#[derive(Debug, Clone)]
pub struct IngestSnippetRequest {
    pub text: String,
    pub title: String,
    pub tenant_id: String,
    pub owner_id: String,
    pub source: String,
    pub tags: Vec<String>,
}

/// Select an extractor by MIME type, falling back to filename suffix, and
/// finally to the text extractor.
fn select_file_kind(mime_type: &str, filename: &str) -> FileKind {
    let mime = mime_type.to_lowercase();
    if mime.contains("pdf") {
        return FileKind::Pdf;
    }
    if mime.contains("image") {
        return FileKind::Image;
    }
    if mime.contains("csv") {
        return FileKind::Csv;
    }
    if mime.contains("text") {
        return FileKind::Text;
    }

    let lower = filename.to_lowercase();
    if lower.ends_with(".pdf") {
        FileKind::Pdf
    } else if lower.ends_with(".csv") || lower.ends_with(".tsv") {
        FileKind::Csv
    } else if ["png", "jpg", "jpeg", "gif", "bmp", "webp"]
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
    {
        FileKind::Image
    } else {
        FileKind::Text
    }
}

/// Ingest an uploaded file: extract, embed, persist.
pub async fn ingest_file(state: &ServerState, req: IngestFileRequest) -> ServerResult<Artifact> {
    let file_kind = select_file_kind(&req.mime_type, &req.filename);
    let artifact_id = uuid::Uuid::new_v4().to_string();
    let embed_cfg = state.semantic_cfg.as_ref();

    let (mut summary, mut chunks) = extract(
        file_kind,
        ExtractInput::Bytes(&req.bytes),
        Some(&req.filename),
        &artifact_id,
        &req.tenant_id,
    )?;

    let file_text = summary.summary.clone().unwrap_or_else(|| req.filename.clone());
    let text_embedding = non_empty(embed(&file_text, embed_cfg).await?);

    let mut image_embedding = None;
    if matches!(file_kind, FileKind::Image) {
        // No dedicated image-encoder model exists in this build; the caption
        // embedding (caption + OCR text run through the same text embedder)
        // doubles as the artifact's image vector.
        let captioned = process_image(&req.bytes, &StubVisionProvider, &NullOcrEngine, true, true, embed_cfg).await?;
        image_embedding = captioned.caption_embedding.clone();
        summary.image_labels = captioned.image_labels.clone();
        summary.ocr_text = captioned.ocr_text.clone();

        if let Some(chunk) = chunks.first_mut() {
            chunk.caption = captioned.caption.clone();
            chunk.image_description = captioned.caption.clone();
            chunk.image_labels = captioned.image_labels.clone();
            chunk.ocr_text = captioned.ocr_text.clone();
            chunk.caption_embedding = captioned.caption_embedding.clone();

            let combined: String = [chunk.caption.as_deref(), chunk.ocr_text.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            let meta = extract_image_chunk_metadata(&combined);
            chunk.keywords = meta.keywords;
            chunk.entities = meta.entities;
        }
    }

    let now = Utc::now();
    let artifact = Artifact {
        id: artifact_id,
        tenant_id: req.tenant_id,
        owner_id: req.owner_id.clone(),
        uri: format!("file:///{}/{}", req.owner_id, req.filename),
        name: req.filename.clone(),
        description: summary.summary.clone(),
        mime_type: req.mime_type,
        kind: ArtifactKind::File,
        file_kind,
        byte_size: req.bytes.len() as u64,
        tags: req.tags,
        vendor: summary.vendor,
        currency: summary.currency,
        amounts_cents: summary.amounts_cents,
        entities: summary.entities,
        keywords: summary.keywords,
        dates: summary.dates,
        summary: summary.summary.or_else(|| Some(format!("Uploaded file: {}", req.filename))),
        text_embedding,
        image_embedding,
        image_labels: summary.image_labels,
        ocr_text: summary.ocr_text,
        type_metadata: summary.type_metadata,
        created_at: now,
        updated_at: now,
    };

    finish_ingest(state, artifact, &mut chunks).await
}

/// Ingest a raw text snippet (user input, agent output, pasted text).
pub async fn ingest_snippet(state: &ServerState, req: IngestSnippetRequest) -> ServerResult<Artifact> {
    let artifact_id = uuid::Uuid::new_v4().to_string();
    let embed_cfg = state.semantic_cfg.as_ref();

    let (mut summary, mut chunks) = extract(
        FileKind::Snippet,
        ExtractInput::Text(&req.text),
        None,
        &artifact_id,
        &req.tenant_id,
    )?;

    if let Some(obj) = summary.type_metadata.as_object_mut() {
        obj.insert("source".to_string(), serde_json::json!(req.source));
    }

    let file_text = summary.summary.clone().unwrap_or_else(|| req.title.clone());
    let text_embedding = non_empty(embed(&file_text, embed_cfg).await?);

    let now = Utc::now();
    let artifact = Artifact {
        id: artifact_id,
        tenant_id: req.tenant_id,
        owner_id: req.owner_id.clone(),
        uri: format!("text:///{}/{}", req.owner_id, req.title.replace(' ', "-")),
        name: req.title.clone(),
        description: summary.summary.clone(),
        mime_type: "text/plain".to_string(),
        kind: ArtifactKind::Text,
        file_kind: FileKind::Snippet,
        byte_size: req.text.len() as u64,
        tags: req.tags,
        vendor: summary.vendor,
        currency: summary.currency,
        amounts_cents: summary.amounts_cents,
        entities: summary.entities,
        keywords: summary.keywords,
        dates: summary.dates,
        summary: summary.summary.or(Some(req.title)),
        text_embedding,
        image_embedding: None,
        image_labels: Vec::new(),
        ocr_text: None,
        type_metadata: summary.type_metadata,
        created_at: now,
        updated_at: now,
    };

    finish_ingest(state, artifact, &mut chunks).await
}

/// Shared tail of both entry points: fill in chunk search fields, embed
/// chunk text in one batch, persist artifact then chunks, then feed the
/// suggestion index. Chunk write and suggestion indexing failures are
/// logged and swallowed; the artifact has already been committed.
async fn finish_ingest(state: &ServerState, artifact: Artifact, chunks: &mut [Chunk]) -> ServerResult<Artifact> {
    let embed_cfg = state.semantic_cfg.as_ref();

    for chunk in chunks.iter_mut() {
        populate_chunk_search_fields(&artifact, chunk);
    }

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_deref().unwrap_or("")).collect();
    if texts.iter().any(|t| !t.is_empty()) {
        match embed_batch(&texts, embed_cfg).await {
            Ok(vectors) => {
                for (chunk, vector) in chunks.iter_mut().zip(vectors) {
                    if chunk.text.is_some() {
                        chunk.text_embedding = non_empty(vector);
                    }
                }
            }
            Err(err) => warn!(error = %err, artifact_id = %artifact.id, "chunk_embedding_failed"),
        }
    }

    state.document_store().put_artifact(&artifact)?;

    if let Err(err) = state.document_store().put_chunks(chunks) {
        warn!(error = %err, artifact_id = %artifact.id, chunk_count = chunks.len(), "chunk_write_failed");
    }

    index_suggestions(state, &artifact, chunks);

    Ok(artifact)
}

/// Build `searchable_text`/`text_normalized`/`ocr_text_normalized` and fold
/// tokenized searchable text into `keywords`. `searchable_text` includes the
/// parent artifact's name/description/tags/keywords at ingest time (not
/// deferred to the first reindex pass), so an immediate reindex with no
/// changed fields is a true no-op.
pub(crate) fn populate_chunk_search_fields(artifact: &Artifact, chunk: &mut Chunk) {
    let tags_joined = artifact.tags.join(" ");
    let keywords_joined = artifact.keywords.join(" ");
    let labels_joined = chunk.image_labels.join(" ");

    let parts = [
        artifact.name.as_str(),
        artifact.description.as_deref().unwrap_or(""),
        tags_joined.as_str(),
        keywords_joined.as_str(),
        chunk.text.as_deref().unwrap_or(""),
        chunk.ocr_text.as_deref().unwrap_or(""),
        chunk.caption.as_deref().unwrap_or(""),
        labels_joined.as_str(),
    ];
    let searchable = create_searchable_text(parts);
    chunk.searchable_text = if searchable.is_empty() { None } else { Some(searchable) };

    chunk.text_normalized = chunk
        .text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(normalize_query);
    chunk.ocr_text_normalized = chunk
        .ocr_text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(normalize_query);

    if let Some(searchable) = &chunk.searchable_text {
        let mut all: std::collections::BTreeSet<String> = chunk.keywords.drain(..).collect();
        all.extend(tokenize_for_search(searchable));
        chunk.keywords = all.into_iter().collect();
    }
}

pub(crate) fn index_suggestions(state: &ServerState, artifact: &Artifact, chunks: &[Chunk]) {
    let combined_content = chunks
        .iter()
        .filter_map(|c| c.text.as_deref())
        .collect::<Vec<_>>()
        .join(" ");
    let content = if combined_content.is_empty() {
        None
    } else {
        Some(combined_content.as_str())
    };

    if let Err(err) = state.suggestion_index().add_terms(
        &artifact.tenant_id,
        Some(&artifact.name),
        &artifact.entities,
        &artifact.keywords,
        artifact.vendor.as_deref(),
        content,
    ) {
        warn!(error = %err, artifact_id = %artifact.id, "suggestion_indexing_failed");
    }
}

pub(crate) fn non_empty(vector: Vec<f32>) -> Option<Vec<f32>> {
    if vector.is_empty() {
        None
    } else {
        Some(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_file_kind_prefers_mime_type() {
        assert_eq!(select_file_kind("application/pdf", "report.txt"), FileKind::Pdf);
        assert_eq!(select_file_kind("image/png", "photo.unknown"), FileKind::Image);
    }

    #[test]
    fn select_file_kind_falls_back_to_suffix() {
        assert_eq!(select_file_kind("application/octet-stream", "data.csv"), FileKind::Csv);
        assert_eq!(select_file_kind("application/octet-stream", "notes.txt"), FileKind::Text);
    }

    #[test]
    fn select_file_kind_defaults_to_text() {
        assert_eq!(select_file_kind("application/octet-stream", "noextension"), FileKind::Text);
    }

    #[test]
    fn searchable_text_includes_parent_name_and_tags() {
        let artifact = Artifact {
            id: "a1".into(),
            tenant_id: "t1".into(),
            owner_id: "o1".into(),
            uri: "uri://a1".into(),
            name: "Invoice Report".into(),
            description: None,
            mime_type: "text/plain".into(),
            kind: ArtifactKind::Text,
            file_kind: FileKind::Snippet,
            byte_size: 0,
            tags: vec!["budget-2025".into()],
            vendor: None,
            currency: None,
            amounts_cents: Vec::new(),
            entities: Vec::new(),
            keywords: Vec::new(),
            dates: Vec::new(),
            summary: None,
            text_embedding: None,
            image_embedding: None,
            image_labels: Vec::new(),
            ocr_text: None,
            type_metadata: serde_json::Value::Null,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut chunk = Chunk::new("a1", "t1", 0, ingest::ChunkType::SnippetChunk);
        chunk.text = Some("quarterly numbers".to_string());

        populate_chunk_search_fields(&artifact, &mut chunk);

        let searchable = chunk.searchable_text.unwrap();
        assert!(searchable.contains("invoice"));
        assert!(searchable.contains("budget-2025"));
        assert!(searchable.contains("quarterly"));
        assert_eq!(chunk.text_normalized.as_deref(), Some("quarterly numbers"));
    }

    #[test]
    fn empty_chunk_has_no_searchable_text_without_parent_fields() {
        let artifact = Artifact {
            id: "a1".into(),
            tenant_id: "t1".into(),
            owner_id: "o1".into(),
            uri: "uri://a1".into(),
            name: "".into(),
            description: None,
            mime_type: "text/plain".into(),
            kind: ArtifactKind::Text,
            file_kind: FileKind::Snippet,
            byte_size: 0,
            tags: Vec::new(),
            vendor: None,
            currency: None,
            amounts_cents: Vec::new(),
            entities: Vec::new(),
            keywords: Vec::new(),
            dates: Vec::new(),
            summary: None,
            text_embedding: None,
            image_embedding: None,
            image_labels: Vec::new(),
            ocr_text: None,
            type_metadata: serde_json::Value::Null,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut chunk = Chunk::new("a1", "t1", 0, ingest::ChunkType::SnippetChunk);
        populate_chunk_search_fields(&artifact, &mut chunk);
        assert!(chunk.searchable_text.is_none());
        assert!(chunk.text_normalized.is_none());
    }
}
