//! Ingestion orchestration: the pipeline itself, pull-request scanning,
//! and optional dedup tracking.

pub mod ingest;
pub mod pulls;
pub mod seen;

pub use ingest::{IngestionPipeline, IngestionSummary};
pub use pulls::PullRequestScanner;
pub use seen::SeenTracker;
