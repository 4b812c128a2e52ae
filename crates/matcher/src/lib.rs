//! # UCFP Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` sits on top of the extraction layer (`ingest`) and the index
//! layer (`index`). It is responsible for turning free-text queries into
//! normalized, classified representations, routing them to keyword,
//! semantic, or hybrid search, and merging chunk-level and artifact-level
//! hits into a single tenant-scoped, ranked result set.
//!
//! ## Core Types
//!
//! - [`SearchMode`]: `Auto`, `Keyword`, `Semantic`, `Hybrid`, `Compound`.
//! - [`SearchConfig`]: score thresholds and the hybrid weighting split.
//! - [`SearchRequest`] / [`SearchResponse`]: the query-time contract.
//! - [`DocumentStore`]: tenant-scoped artifact/chunk persistence backing a
//!   [`SearchService`].
//!
//! ## Example Usage
//!
//! ```no_run
//! use index::InMemoryBackend;
//! use matcher::{DocumentStore, SearchConfig, SearchMode, SearchRequest, SearchService};
//!
//! let artifacts = InMemoryBackend::new();
//! let chunks = InMemoryBackend::new();
//! let store = DocumentStore::new(&artifacts, &chunks);
//! let service = SearchService::new(store, SearchConfig::default());
//!
//! let req = SearchRequest {
//!     query: "invoice 2024".into(),
//!     tenant_id: "tenant-a".into(),
//!     limit: 10,
//!     mode: SearchMode::Auto,
//! };
//!
//! let response = service.search(&req, None);
//! for hit in response.results {
//!     println!("{} score={} match_type={}", hit.file_name, hit.score, hit.match_type);
//! }
//! ```

pub mod search;

pub use crate::search::{
    DocumentStore, SearchConfig, SearchMode, SearchRequest, SearchResponse, SearchResult,
    SearchService,
};
