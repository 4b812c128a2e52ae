//! Contextual document search: query classification, diacritic-insensitive
//! normalization, and auto/semantic/keyword/hybrid/compound routing over
//! tenant-scoped artifacts and chunks.
//!
//! Unlike [`crate::engine::Matcher`] (which matches one document's
//! fingerprint against an index of other fingerprints), this module answers
//! free-text queries against a store of [`Artifact`]/[`Chunk`] records,
//! merging keyword and vector signal into a single ranked result list.

use std::collections::HashMap;

use canonical::{normalize_query, tokenize_for_search};
use index::IndexBackend;
use ingest::{analyze_query, Artifact, Chunk, QueryAnalysis};
use serde::{Deserialize, Serialize};

/// Cosine-similarity thresholds and the hybrid mix weight, kept as named,
/// overridable constants rather than hard-coded inline.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub semantic_artifact_threshold: f32,
    pub semantic_chunk_threshold: f32,
    pub hybrid_semantic_weight: f32,
    pub hybrid_keyword_weight: f32,
    pub default_limit: usize,
    pub artifact_candidate_cap: usize,
    pub chunk_candidate_cap: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            semantic_artifact_threshold: 0.15,
            semantic_chunk_threshold: 0.05,
            hybrid_semantic_weight: 0.6,
            hybrid_keyword_weight: 0.4,
            default_limit: 10,
            artifact_candidate_cap: 2000,
            chunk_candidate_cap: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Auto,
    Semantic,
    Keyword,
    Hybrid,
    Compound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub tenant_id: String,
    pub limit: usize,
    pub mode: SearchMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub file_name: String,
    pub file_kind: String,
    pub summary: Option<String>,
    pub vendor: Option<String>,
    pub score: f32,
    pub match_type: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub open_url: String,
    pub matched_in_chunk: Option<u32>,
    pub chunk_preview: Option<String>,
    pub matched_field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub query_analysis: QueryAnalysis,
    pub mode: SearchMode,
    pub results: Vec<SearchResult>,
    pub total: usize,
}

/// Backing store search reads from: the artifact and chunk records written
/// by ingestion, addressed by tenant-scoped keys over two distinct
/// [`IndexBackend`]s (kept separate so a whole-backend `scan` never has to
/// distinguish artifact bytes from chunk bytes).
pub struct DocumentStore<'a> {
    artifacts: &'a dyn IndexBackend,
    chunks: &'a dyn IndexBackend,
}

impl<'a> DocumentStore<'a> {
    pub fn new(artifacts: &'a dyn IndexBackend, chunks: &'a dyn IndexBackend) -> Self {
        Self { artifacts, chunks }
    }

    fn artifact_key(tenant: &str, id: &str) -> String {
        format!("{tenant}:artifact:{id}")
    }

    fn chunk_key(tenant: &str, artifact_id: &str, idx: u32) -> String {
        format!("{tenant}:chunk:{artifact_id}:{idx}")
    }

    pub fn put_artifact(&self, artifact: &Artifact) -> Result<(), index::IndexError> {
        let bytes = serde_json::to_vec(artifact).map_err(|e| index::IndexError::Encode(e.to_string()))?;
        self.artifacts.put(&Self::artifact_key(&artifact.tenant_id, &artifact.id), &bytes)
    }

    pub fn put_chunk(&self, chunk: &Chunk) -> Result<(), index::IndexError> {
        let bytes = serde_json::to_vec(chunk).map_err(|e| index::IndexError::Encode(e.to_string()))?;
        self.chunks.put(
            &Self::chunk_key(&chunk.tenant_id, &chunk.artifact_id, chunk.chunk_index),
            &bytes,
        )
    }

    /// Write every chunk in one backend call, per the ingestion orchestrator's
    /// "insert all chunks in one write" contract.
    pub fn put_chunks(&self, chunks: &[Chunk]) -> Result<(), index::IndexError> {
        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let bytes = serde_json::to_vec(chunk).map_err(|e| index::IndexError::Encode(e.to_string()))?;
            entries.push((Self::chunk_key(&chunk.tenant_id, &chunk.artifact_id, chunk.chunk_index), bytes));
        }
        self.chunks.batch_put(entries)
    }

    pub fn get_artifact(&self, tenant: &str, id: &str) -> Option<Artifact> {
        let bytes = self.artifacts.get(&Self::artifact_key(tenant, id)).ok()??;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn delete_artifact(&self, tenant: &str, id: &str) -> Result<(), index::IndexError> {
        self.artifacts.delete(&Self::artifact_key(tenant, id))
    }

    /// All chunks belonging to one artifact, unordered by the backend but
    /// stable via `chunk_index` if the caller needs to sort.
    pub fn chunks_for_artifact(&self, tenant: &str, artifact_id: &str) -> Vec<Chunk> {
        self.tenant_chunks(tenant, usize::MAX)
            .into_iter()
            .filter(|c| c.artifact_id == artifact_id)
            .collect()
    }

    pub fn delete_chunk(&self, tenant: &str, artifact_id: &str, idx: u32) -> Result<(), index::IndexError> {
        self.chunks.delete(&Self::chunk_key(tenant, artifact_id, idx))
    }

    /// All artifacts for `tenant`, up to `cap`, decoded from a full backend
    /// scan filtered by tenant id.
    pub fn tenant_artifacts(&self, tenant: &str, cap: usize) -> Vec<Artifact> {
        let mut out = Vec::new();
        let _ = self.artifacts.scan(&mut |bytes| {
            if out.len() >= cap {
                return Ok(());
            }
            if let Ok(artifact) = serde_json::from_slice::<Artifact>(bytes) {
                if artifact.tenant_id == tenant {
                    out.push(artifact);
                }
            }
            Ok(())
        });
        out
    }

    pub fn tenant_chunks(&self, tenant: &str, cap: usize) -> Vec<Chunk> {
        let mut out = Vec::new();
        let _ = self.chunks.scan(&mut |bytes| {
            if out.len() >= cap {
                return Ok(());
            }
            if let Ok(chunk) = serde_json::from_slice::<Chunk>(bytes) {
                if chunk.tenant_id == tenant {
                    out.push(chunk);
                }
            }
            Ok(())
        });
        out
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(200).collect();
    if text.chars().count() > 200 {
        out.push('…');
    }
    out
}

fn open_url(id: &str, chunk: Option<&Chunk>) -> String {
    match chunk.and_then(|c| c.locator.page_number.map(|p| ("page", p)).or(c.locator.row_index.map(|r| ("row", r)))) {
        Some((key, value)) => format!("/resources/{id}?{key}={value}"),
        None => format!("/resources/{id}"),
    }
}

/// Query classification + multi-strategy search over [`DocumentStore`].
pub struct SearchService<'a> {
    store: DocumentStore<'a>,
    config: SearchConfig,
}

impl<'a> SearchService<'a> {
    pub fn new(store: DocumentStore<'a>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    pub fn search(&self, req: &SearchRequest, query_embedding: Option<&[f32]>) -> SearchResponse {
        if req.query.trim().is_empty() {
            return SearchResponse {
                query: req.query.clone(),
                query_analysis: QueryAnalysis::default(),
                mode: req.mode,
                results: Vec::new(),
                total: 0,
            };
        }

        let analysis = analyze_query(&req.query);
        let q_norm = normalize_query(&req.query);
        let q_tokens = tokenize_for_search(&q_norm);

        let mode = self.route(req.mode, &analysis, &q_tokens);
        let limit = if req.limit == 0 { self.config.default_limit } else { req.limit };

        let mut results = match mode {
            SearchMode::Keyword | SearchMode::Compound => {
                self.keyword_search(&req.tenant_id, &req.query, &q_norm, &q_tokens, &analysis, limit)
            }
            SearchMode::Semantic => match query_embedding {
                Some(vec) => self.semantic_search(&req.tenant_id, vec, limit),
                None => Vec::new(),
            },
            SearchMode::Hybrid => {
                let keyword = self.keyword_search(&req.tenant_id, &req.query, &q_norm, &q_tokens, &analysis, limit * 2);
                let semantic = query_embedding
                    .map(|vec| self.semantic_search(&req.tenant_id, vec, limit * 2))
                    .unwrap_or_default();
                self.merge_hybrid(keyword, semantic, limit)
            }
            SearchMode::Auto => unreachable!("route() never returns Auto"),
        };

        results.truncate(limit);
        let total = results.len();
        SearchResponse {
            query: req.query.clone(),
            query_analysis: analysis,
            mode,
            results,
            total,
        }
    }

    fn route(&self, requested: SearchMode, analysis: &QueryAnalysis, q_tokens: &[String]) -> SearchMode {
        if requested != SearchMode::Auto {
            return requested;
        }
        if !analysis.ids.is_empty() {
            return SearchMode::Keyword;
        }
        if q_tokens.len() <= 2 && analysis.money.is_empty() && analysis.dates.is_empty() {
            return SearchMode::Keyword;
        }
        if !analysis.money.is_empty() || !analysis.dates.is_empty() {
            return SearchMode::Hybrid;
        }
        SearchMode::Semantic
    }

    fn keyword_search(
        &self,
        tenant: &str,
        raw_query: &str,
        q_norm: &str,
        q_tokens: &[String],
        analysis: &QueryAnalysis,
        limit: usize,
    ) -> Vec<SearchResult> {
        let artifacts = self.store.tenant_artifacts(tenant, self.config.artifact_candidate_cap);
        let mut by_artifact: HashMap<String, SearchResult> = HashMap::new();

        let raw_lower = raw_query.to_lowercase();
        for artifact in &artifacts {
            let score_and_field = [
                (artifact.name.to_lowercase().contains(&raw_lower), "file_name", 1.0f32),
                (
                    artifact.keywords.iter().any(|k| k.to_lowercase().contains(&raw_lower)),
                    "keywords",
                    0.95,
                ),
                (
                    artifact.summary.as_deref().map(|s| s.to_lowercase().contains(&raw_lower)).unwrap_or(false),
                    "summary",
                    0.9,
                ),
                (false, "content", 0.85),
                (
                    artifact.entities.iter().any(|e| e.to_lowercase().contains(&raw_lower)),
                    "entities",
                    0.8,
                ),
            ]
            .into_iter()
            .find(|(matched, _, _)| *matched);

            if let Some((_, field, score)) = score_and_field {
                self.upsert_best(&mut by_artifact, artifact, score, "keyword", Some(field), None, None, None);
            }

            if artifact.keywords.iter().any(|k| analysis.ids.iter().any(|id| id.value == *k)) {
                self.upsert_best(&mut by_artifact, artifact, 1.0, "exact_keyword", Some("keywords"), None, None, None);
            }
            if let Some(vendor) = &artifact.vendor {
                if analysis.vendors.iter().any(|v| v.eq_ignore_ascii_case(vendor)) {
                    self.upsert_best(&mut by_artifact, artifact, 0.95, "vendor", Some("vendor"), None, None, None);
                }
            }
        }

        let artifacts_by_id: HashMap<&str, &Artifact> =
            artifacts.iter().map(|a| (a.id.as_str(), a)).collect();
        let chunks = self.store.tenant_chunks(tenant, self.config.chunk_candidate_cap);
        for chunk in &chunks {
            let Some(artifact) = artifacts_by_id.get(chunk.artifact_id.as_str()) else {
                continue;
            };
            if let Some((score, field)) = Self::chunk_keyword_score(chunk, q_norm, q_tokens) {
                self.upsert_best(
                    &mut by_artifact,
                    artifact,
                    score,
                    "keyword",
                    Some(field),
                    Some(chunk.chunk_index),
                    chunk.text.as_deref().or(chunk.ocr_text.as_deref()),
                    Some(chunk),
                );
            }
        }

        let mut out: Vec<SearchResult> = by_artifact.into_values().collect();
        out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        out.truncate(limit);
        out
    }

    fn chunk_keyword_score(chunk: &Chunk, q_norm: &str, q_tokens: &[String]) -> Option<(f32, &'static str)> {
        if let Some(searchable) = &chunk.searchable_text {
            if searchable.contains(q_norm) {
                return Some((1.00, "searchable_text"));
            }
        }
        if let Some(ocr) = &chunk.ocr_text_normalized {
            if ocr.contains(q_norm) {
                return Some((0.98, "ocr_text_normalized"));
            }
        }
        if let Some(text) = &chunk.text_normalized {
            if text.contains(q_norm) {
                return Some((0.95, "text_normalized"));
            }
        }
        if let Some(desc) = &chunk.image_description {
            if normalize_query(desc).contains(q_norm) {
                return Some((0.93, "image_description"));
            }
        }

        if q_tokens.is_empty() {
            return None;
        }
        let fields: [(Option<&str>, f32, &'static str); 3] = [
            (chunk.searchable_text.as_deref(), 0.6, "searchable_text"),
            (chunk.ocr_text_normalized.as_deref(), 0.55, "ocr_text_normalized"),
            (chunk.text_normalized.as_deref(), 0.5, "text_normalized"),
        ];
        let mut best: Option<(f32, &'static str)> = None;
        for (field, base, name) in fields {
            let Some(field) = field else { continue };
            let field_tokens = tokenize_for_search(field);
            let overlap = q_tokens.iter().filter(|t| field_tokens.contains(t)).count();
            let ratio = overlap as f32 / q_tokens.len() as f32;
            if ratio < 0.25 {
                continue;
            }
            let score = base * ratio;
            if best.map(|(s, _)| score > s).unwrap_or(true) {
                best = Some((score, name));
            }
        }
        best
    }

    #[allow(clippy::too_many_arguments)]
    fn upsert_best(
        &self,
        by_artifact: &mut HashMap<String, SearchResult>,
        artifact: &Artifact,
        score: f32,
        match_type: &str,
        matched_field: Option<&str>,
        matched_in_chunk: Option<u32>,
        preview_source: Option<&str>,
        chunk: Option<&Chunk>,
    ) {
        let entry = by_artifact.entry(artifact.id.clone());
        let is_better = match entry {
            std::collections::hash_map::Entry::Occupied(ref o) => score > o.get().score,
            std::collections::hash_map::Entry::Vacant(_) => true,
        };
        if !is_better {
            return;
        }
        by_artifact.insert(
            artifact.id.clone(),
            SearchResult {
                id: artifact.id.clone(),
                file_name: artifact.name.clone(),
                file_kind: format!("{:?}", artifact.file_kind).to_lowercase(),
                summary: artifact.summary.clone(),
                vendor: artifact.vendor.clone(),
                score,
                match_type: match_type.to_string(),
                created_at: artifact.created_at,
                open_url: open_url(&artifact.id, chunk),
                matched_in_chunk,
                chunk_preview: preview_source.map(preview),
                matched_field: matched_field.map(str::to_string),
            },
        );
    }

    fn semantic_search(&self, tenant: &str, query_vec: &[f32], limit: usize) -> Vec<SearchResult> {
        let artifacts = self.store.tenant_artifacts(tenant, self.config.artifact_candidate_cap.min(2 * limit.max(1)));
        let mut by_artifact: HashMap<String, SearchResult> = HashMap::new();

        for artifact in &artifacts {
            let Some(vec) = &artifact.text_embedding else { continue };
            let score = cosine(vec, query_vec);
            if score >= self.config.semantic_artifact_threshold {
                self.upsert_best(&mut by_artifact, artifact, score, "semantic_document", None, None, None, None);
            }
        }

        let artifacts_by_id: HashMap<&str, &Artifact> = artifacts.iter().map(|a| (a.id.as_str(), a)).collect();
        let chunks = self.store.tenant_chunks(tenant, self.config.chunk_candidate_cap.min(10 * limit.max(1)));
        for chunk in &chunks {
            let Some(vec) = &chunk.text_embedding else { continue };
            let Some(artifact) = artifacts_by_id.get(chunk.artifact_id.as_str()) else { continue };
            let score = cosine(vec, query_vec);
            if score < self.config.semantic_chunk_threshold {
                continue;
            }
            let current_better = by_artifact
                .get(&artifact.id)
                .map(|r| r.match_type == "semantic_chunk" && r.score >= score)
                .unwrap_or(false);
            if current_better {
                continue;
            }
            self.upsert_best(
                &mut by_artifact,
                artifact,
                score,
                "semantic_chunk",
                None,
                Some(chunk.chunk_index),
                chunk.text.as_deref(),
                Some(chunk),
            );
        }

        let mut out: Vec<SearchResult> = by_artifact.into_values().collect();
        out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        out.truncate(limit);
        out
    }

    fn merge_hybrid(&self, keyword: Vec<SearchResult>, semantic: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
        let mut merged: HashMap<String, SearchResult> = HashMap::new();
        let mut keyword_scores: HashMap<String, f32> = HashMap::new();
        let mut semantic_scores: HashMap<String, f32> = HashMap::new();

        for r in &keyword {
            keyword_scores.insert(r.id.clone(), r.score);
        }
        for r in &semantic {
            semantic_scores.insert(r.id.clone(), r.score);
        }

        for r in keyword.into_iter().chain(semantic.into_iter()) {
            merged.entry(r.id.clone()).or_insert(r);
        }

        let mut out: Vec<SearchResult> = merged
            .into_values()
            .map(|mut r| {
                let k = keyword_scores.get(&r.id).copied();
                let s = semantic_scores.get(&r.id).copied();
                r.score = match (k, s) {
                    (Some(k), Some(s)) => {
                        r.match_type = "hybrid".to_string();
                        self.config.hybrid_semantic_weight * s + self.config.hybrid_keyword_weight * k
                    }
                    (Some(k), None) => k,
                    (None, Some(s)) => s,
                    (None, None) => r.score,
                };
                r
            })
            .collect();

        out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        out.truncate(limit);
        out
    }
}
