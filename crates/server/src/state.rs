use crate::config::ServerConfig;
use crate::error::ServerResult;
use dashmap::DashMap;
use index::{InMemoryBackend, SuggestionIndex};
use matcher::{DocumentStore, SearchConfig, SearchService};
use semantic::SemanticConfig;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Rate limit tracking: API key -> (count, window_start)
    pub rate_limiter: Arc<DashMap<String, (u32, std::time::Instant)>>,

    /// Embedding configuration shared by ingestion (C7) and search (C9).
    pub semantic_cfg: Arc<SemanticConfig>,

    /// Backends for the artifact/chunk/suggestion stores consumed by C7
    /// (ingestion), C8 (suggestions) and C9 (search). Kept as three
    /// separate backends so a whole-backend `scan` never has to
    /// distinguish one record kind's bytes from another's.
    pub artifacts_backend: Arc<InMemoryBackend>,
    pub chunks_backend: Arc<InMemoryBackend>,
    pub suggestions_backend: Arc<InMemoryBackend>,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let semantic_cfg = SemanticConfig {
            mode: config.embedding.mode.clone(),
            ..SemanticConfig::default()
        };

        Ok(Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(DashMap::new()),
            semantic_cfg: Arc::new(semantic_cfg),
            artifacts_backend: Arc::new(InMemoryBackend::new()),
            chunks_backend: Arc::new(InMemoryBackend::new()),
            suggestions_backend: Arc::new(InMemoryBackend::new()),
        })
    }

    /// Document store view over the artifact/chunk backends, for C7/C9/C10.
    pub fn document_store(&self) -> DocumentStore<'_> {
        DocumentStore::new(self.artifacts_backend.as_ref(), self.chunks_backend.as_ref())
    }

    /// Suggestion index view over the suggestion backend, for C7/C8/C10.
    pub fn suggestion_index(&self) -> SuggestionIndex<'_> {
        SuggestionIndex::new(self.suggestions_backend.as_ref())
    }

    /// Search service configured from `config.search`.
    pub fn search_service(&self) -> SearchService<'_> {
        let cfg = &self.config.search;
        SearchService::new(
            self.document_store(),
            SearchConfig {
                semantic_artifact_threshold: cfg.semantic_artifact_threshold,
                semantic_chunk_threshold: cfg.semantic_chunk_threshold,
                hybrid_semantic_weight: cfg.hybrid_semantic_weight,
                hybrid_keyword_weight: 1.0 - cfg.hybrid_semantic_weight,
                default_limit: cfg.default_limit,
                ..SearchConfig::default()
            },
        )
    }

    /// Check if API key is valid
    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Check rate limit for API key
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = std::time::Instant::now();
        let window = std::time::Duration::from_secs(60);
        let limit = self.config.rate_limit_per_minute;

        let mut entry = self.rate_limiter.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        // Reset if window has passed
        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        // Check limit
        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
