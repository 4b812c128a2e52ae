//! UCFP Canonical Layer - Search Text Normalization
//!
//! This crate normalizes text for search: artifact/chunk content at ingest
//! time and queries at search time go through the same NFKC-normalizing,
//! diacritic-insensitive pipeline so keyword matching is consistent on both
//! sides.
//!
//! # Overview
//!
//! - **Unicode normalization**: NFKC normalization plus diacritic stripping
//!   for case- and accent-insensitive matching (`normalize_query`), or a
//!   case-preserving variant for embedding calls (`normalize_for_embedding`).
//! - **Whitespace normalization**: collapsing consecutive whitespace to
//!   single spaces (`collapse_whitespace`).
//! - **Search tokenization**: splitting normalized text into search tokens,
//!   dropping anything shorter than two characters (`tokenize_for_search`).
//! - **Searchable-text assembly**: joining multiple artifact/chunk fields
//!   into one normalized blob for substring and token-overlap matching
//!   (`create_searchable_text`).
//!
//! This crate is pure and side-effect free: no I/O, no network calls, no
//! dependence on wall-clock time or locale.

mod search_text;
mod whitespace;

pub use crate::search_text::{
    create_searchable_text, normalize, normalize_for_embedding, normalize_query,
    tokenize_for_search,
};
pub use crate::whitespace::collapse_whitespace;
