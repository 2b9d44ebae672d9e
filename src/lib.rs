//! ```text
//! GitHub contents API ──► github::RepoWalker ──► DecodedDocument
//!        │                        │
//!        └── github::RateLimitedRequester (reset-aware wait & retry)
//!
//! DecodedDocument ──► sectionizer::Sectionizer ──► ordered sections
//!
//! sections ──► pipeline::IngestionPipeline ──► store::SectionSink
//!                      │                             └─► store::SqliteSectionStore
//!                      └─► pipeline::PullRequestScanner (changed files only)
//! ```
//!
//! Ingests a repository's documentation tree into a vector store: each file
//! is split into sections, each section is embedded and persisted together
//! with its provenance URL. A pull-request mode re-ingests only the
//! documentation paths a PR touched.

pub mod config;
pub mod github;
pub mod pipeline;
pub mod sectionizer;
pub mod store;
pub mod types;

pub use config::IngestConfig;
pub use github::{RateLimitedRequester, RepoWalker};
pub use pipeline::{IngestionPipeline, IngestionSummary, PullRequestScanner, SeenTracker};
pub use sectionizer::Sectionizer;
pub use store::{SectionRecord, SectionSink, SqliteSectionStore};
pub use types::IngestError;
