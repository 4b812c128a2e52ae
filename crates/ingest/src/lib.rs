//! UCFP Ingest Layer
//!
//! This is where content enters the search pipeline. Given raw bytes or text
//! plus a file kind, [`extract`] dispatches to the right type-specific
//! extractor and returns an [`ArtifactSummary`] (vendor/currency/entities/
//! keywords/dates and type-specific metadata) alongside the document's
//! [`Chunk`]s.
//!
//! ## What lives here
//!
//! - **Structured field extraction** - money, IDs, emails, IBANs, phone
//!   numbers, dates, file-type hints, capitalized entities: shared regex
//!   helpers reused by both extraction and query analysis.
//! - **Query analysis** - [`analyze_query`] runs the same structured-field
//!   cascade over a search query and classifies it for routing.
//! - **Type-specific extraction** - PDF, CSV, image, plain text, and text
//!   snippet extractors, each producing [`Chunk`]s with a shared summary pass.
//! - **Metadata extraction** - vendor normalization, keyword extraction,
//!   CSV-row and image-chunk metadata helpers.
mod artifact;
mod error;
mod extract;
mod metadata_extractor;
mod query_analyzer;
mod structured_extract;
mod vendor;

pub use crate::artifact::{Artifact, ArtifactKind, ArtifactSummary, Chunk, ChunkLocator, ChunkType, FileKind};
pub use crate::error::IngestError;
pub use crate::extract::{extract, ExtractInput};
pub use crate::metadata_extractor::{
    extract_csv_row_metadata, extract_image_chunk_metadata, extract_keywords, extract_metadata,
    ExtractedMetadata,
};
pub use crate::query_analyzer::{analyze_query, QueryAnalysis, QueryRouter};
pub use crate::structured_extract::{
    extract_capitalized_entities, extract_dates, extract_emails, extract_file_type_hints,
    extract_ibans, extract_ids, extract_money, extract_phone_numbers, IdMatch, MoneyMatch,
};
pub use crate::vendor::VendorNormalizer;
