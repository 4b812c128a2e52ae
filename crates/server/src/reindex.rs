//! Reindex orchestrator (C10): brings an artifact's chunks, embeddings, and
//! suggestion-index entries back in sync with its current stored state
//! after a create/update/delete event.
//!
//! Each stage is independently gated by [`crate::config::ReindexConfig`] and
//! independently fault-tolerant: a failure in one stage is logged and does
//! not block the next. Events for distinct artifact ids may run concurrently;
//! events for the same artifact id must be serialized by the caller, since
//! this module does no locking of its own.

use semantic::embed;
use tracing::warn;

use crate::error::ServerResult;
use crate::ingestion::{index_suggestions, non_empty, populate_chunk_search_fields};
use crate::state::ServerState;

/// Parent-artifact fields whose change can alter a chunk's `searchable_text`,
/// since [`populate_chunk_search_fields`] folds them into every chunk.
const SEARCHABLE_TEXT_FIELDS: &[&str] = &["name", "description", "tags", "keywords"];

/// What happened to an artifact, driving which reindex stages run.
#[derive(Debug, Clone)]
pub enum ReindexEvent {
    /// A brand new artifact: every stage runs unconditionally.
    Created,
    /// An existing artifact changed. `changed_fields` names the artifact
    /// fields that were written (e.g. `"name"`, `"tags"`); stages that don't
    /// depend on any of them are skipped.
    Updated { changed_fields: Vec<String> },
    /// The artifact was removed: stages become pure cleanup.
    Deleted,
}

/// Reindex one artifact in response to `event`. Returns `Ok(())` even when
/// individual stages fail internally; a stage failure is logged, not
/// propagated, so that one broken step never blocks the others.
pub async fn reindex_artifact(state: &ServerState, tenant_id: &str, artifact_id: &str, event: ReindexEvent) -> ServerResult<()> {
    if let ReindexEvent::Deleted = event {
        remove_artifact(state, tenant_id, artifact_id);
        return Ok(());
    }

    let Some(artifact) = state.document_store().get_artifact(tenant_id, artifact_id) else {
        warn!(tenant_id, artifact_id, "reindex_requested_for_missing_artifact");
        return Ok(());
    };

    let needs_searchable_text = affects_searchable_text(&event);

    let cfg = &state.config.reindex;
    let mut chunks = state.document_store().chunks_for_artifact(tenant_id, artifact_id);

    if cfg.reindex_chunks_enabled && needs_searchable_text {
        reindex_chunk_searchable_text(state, &artifact, &mut chunks);
    }

    if cfg.reindex_embeddings_enabled {
        reindex_embeddings(state, &artifact, &mut chunks).await;
    }

    if cfg.reindex_suggestions_enabled {
        index_suggestions(state, &artifact, &chunks);
    }

    Ok(())
}

/// Whether `event` touches a parent-artifact field that
/// [`populate_chunk_search_fields`] folds into every chunk's searchable text.
fn affects_searchable_text(event: &ReindexEvent) -> bool {
    match event {
        ReindexEvent::Created => true,
        ReindexEvent::Updated { changed_fields } => changed_fields.iter().any(|f| SEARCHABLE_TEXT_FIELDS.contains(&f.as_str())),
        ReindexEvent::Deleted => false,
    }
}

/// Recompute `searchable_text`/`text_normalized`/`ocr_text_normalized` for
/// every chunk and write back only the ones that actually changed, so an
/// update that doesn't touch searchable content costs no chunk writes.
fn reindex_chunk_searchable_text(state: &ServerState, artifact: &ingest::Artifact, chunks: &mut [ingest::Chunk]) {
    let mut changed = Vec::new();
    for chunk in chunks.iter_mut() {
        let before = chunk.searchable_text.clone();
        populate_chunk_search_fields(artifact, chunk);
        if chunk.searchable_text != before {
            changed.push(chunk.clone());
        }
    }

    if changed.is_empty() {
        return;
    }

    if let Err(err) = state.document_store().put_chunks(&changed) {
        warn!(error = %err, artifact_id = %artifact.id, changed = changed.len(), "chunk_reindex_write_failed");
    }
}

/// Recompute chunk and artifact text embeddings. Chunk embeddings are
/// batched in one call; an artifact with no content-bearing chunks still
/// gets its own summary text re-embedded, since the artifact's `name`/
/// `description` may have changed independent of any chunk.
async fn reindex_embeddings(state: &ServerState, artifact: &ingest::Artifact, chunks: &mut [ingest::Chunk]) {
    let embed_cfg = state.semantic_cfg.as_ref();

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_deref().unwrap_or("")).collect();
    if texts.iter().any(|t| !t.is_empty()) {
        match semantic::embed_batch(&texts, embed_cfg).await {
            Ok(vectors) => {
                let mut changed = Vec::new();
                for (chunk, vector) in chunks.iter_mut().zip(vectors) {
                    if chunk.text.is_none() {
                        continue;
                    }
                    let embedding = non_empty(vector);
                    if chunk.text_embedding != embedding {
                        chunk.text_embedding = embedding;
                        changed.push(chunk.clone());
                    }
                }
                if !changed.is_empty() {
                    if let Err(err) = state.document_store().put_chunks(&changed) {
                        warn!(error = %err, artifact_id = %artifact.id, "chunk_embedding_write_failed");
                    }
                }
            }
            Err(err) => warn!(error = %err, artifact_id = %artifact.id, "chunk_reembedding_failed"),
        }
    }

    let summary_text = artifact.summary.clone().unwrap_or_else(|| artifact.name.clone());
    match embed(&summary_text, embed_cfg).await {
        Ok(vector) => {
            let embedding = non_empty(vector);
            if embedding != artifact.text_embedding {
                let mut updated = artifact.clone();
                updated.text_embedding = embedding;
                if let Err(err) = state.document_store().put_artifact(&updated) {
                    warn!(error = %err, artifact_id = %artifact.id, "artifact_embedding_write_failed");
                }
            }
        }
        Err(err) => warn!(error = %err, artifact_id = %artifact.id, "artifact_reembedding_failed"),
    }
}

fn remove_artifact(state: &ServerState, tenant_id: &str, artifact_id: &str) {
    let chunks = state.document_store().chunks_for_artifact(tenant_id, artifact_id);
    for chunk in &chunks {
        if let Err(err) = state.document_store().delete_chunk(tenant_id, artifact_id, chunk.chunk_index) {
            warn!(error = %err, tenant_id, artifact_id, chunk_index = chunk.chunk_index, "chunk_delete_failed");
        }
    }

    let filename = state.document_store().get_artifact(tenant_id, artifact_id).map(|a| a.name);

    if let Err(err) = state.document_store().delete_artifact(tenant_id, artifact_id) {
        warn!(error = %err, tenant_id, artifact_id, "artifact_delete_failed");
    }

    if let Some(filename) = filename {
        if let Err(err) = state.suggestion_index().remove_filename(tenant_id, &filename) {
            warn!(error = %err, tenant_id, artifact_id, "suggestion_removal_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use ingest::{Artifact, ArtifactKind, ChunkType, FileKind};

    fn test_artifact(id: &str, tenant_id: &str, name: &str) -> Artifact {
        Artifact {
            id: id.to_string(),
            tenant_id: tenant_id.to_string(),
            owner_id: "o1".to_string(),
            uri: format!("uri://{id}"),
            name: name.to_string(),
            description: None,
            mime_type: "text/plain".to_string(),
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
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn created_event_always_affects_searchable_text() {
        assert!(affects_searchable_text(&ReindexEvent::Created));
    }

    #[test]
    fn updated_event_checks_changed_fields() {
        let touches_name = ReindexEvent::Updated { changed_fields: vec!["name".to_string()] };
        assert!(affects_searchable_text(&touches_name));

        let touches_other = ReindexEvent::Updated { changed_fields: vec!["mime_type".to_string()] };
        assert!(!affects_searchable_text(&touches_other));
    }

    #[test]
    fn deleted_event_never_affects_searchable_text() {
        assert!(!affects_searchable_text(&ReindexEvent::Deleted));
    }

    #[test]
    fn rewrites_only_chunks_whose_searchable_text_changed() {
        let state = ServerState::new(ServerConfig::default()).unwrap();
        let artifact = test_artifact("a1", "t1", "Invoice Report");
        state.document_store().put_artifact(&artifact).unwrap();

        let mut stale = ingest::Chunk::new("a1", "t1", 0, ChunkType::SnippetChunk);
        stale.text = Some("quarterly numbers".to_string());
        stale.searchable_text = Some("stale value".to_string());
        state.document_store().put_chunks(&[stale.clone()]).unwrap();

        let mut chunks = vec![stale];
        reindex_chunk_searchable_text(&state, &artifact, &mut chunks);

        let stored = state.document_store().chunks_for_artifact("t1", "a1");
        assert_eq!(stored.len(), 1);
        assert_ne!(stored[0].searchable_text.as_deref(), Some("stale value"));
        assert!(stored[0].searchable_text.as_ref().unwrap().contains("quarterly"));
        assert!(stored[0].searchable_text.as_ref().unwrap().contains("invoice"));
    }

    #[test]
    fn remove_artifact_deletes_chunks_and_artifact() {
        let state = ServerState::new(ServerConfig::default()).unwrap();
        let artifact = test_artifact("a1", "t1", "Invoice Report");
        state.document_store().put_artifact(&artifact).unwrap();

        let chunk = ingest::Chunk::new("a1", "t1", 0, ChunkType::SnippetChunk);
        state.document_store().put_chunks(&[chunk]).unwrap();

        remove_artifact(&state, "t1", "a1");

        assert!(state.document_store().get_artifact("t1", "a1").is_none());
        assert!(state.document_store().chunks_for_artifact("t1", "a1").is_empty());
    }
}
