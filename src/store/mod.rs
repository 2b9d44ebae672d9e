//! Embedding/storage collaborators for ingested sections.
//!
//! The pipeline hands each section to a [`SectionSink`]; the sink owns both
//! the embedding call and the vector-store insert. Keeping both behind one
//! trait matches how the pipeline treats them: a single "submitted or not"
//! outcome per section, with no retry on failure.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::IngestError;

pub use sqlite::{SectionDocument, SqliteSectionStore};

/// One section ready for embedding and persistence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectionRecord {
    /// Unique id for this record.
    pub id: String,
    /// Provenance URL shared by all sections of the same document.
    pub source_url: String,
    /// Zero-based position of the section within its document. Order is
    /// semantically meaningful for downstream context assembly.
    pub section_index: usize,
    /// Section text exactly as sectionized, newlines included.
    pub content: String,
}

impl SectionRecord {
    pub fn new(
        id: impl Into<String>,
        source_url: impl Into<String>,
        section_index: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_url: source_url.into(),
            section_index,
            content: content.into(),
        }
    }
}

/// Destination for embedded sections.
///
/// Implementations embed `record.content` (after replacing newlines with
/// spaces for the embedding call) and persist
/// `{content, embedding, metadata{source_url}}`. Submissions for one
/// document arrive strictly in section order and never concurrently.
#[async_trait]
pub trait SectionSink: Send + Sync {
    async fn submit(&self, record: SectionRecord) -> Result<(), IngestError>;
}
