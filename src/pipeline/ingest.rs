//! The ingestion pipeline: walk, sectionize, embed, store.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::github::requester::{Clock, RateLimitedRequester, SystemClock};
use crate::github::walker::RepoWalker;
use crate::pipeline::seen::{self, SeenTracker};
use crate::sectionizer::Sectionizer;
use crate::store::{SectionRecord, SectionSink};
use crate::types::IngestError;

/// Counters accumulated over one pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    pub documents_scanned: usize,
    pub documents_ingested: usize,
    pub documents_skipped: usize,
    pub sections_submitted: usize,
    pub sections_failed: usize,
}

impl IngestionSummary {
    /// Folds another summary into this one. Used by the pull-request
    /// scanner, which runs the pipeline once per changed file.
    pub fn merge(&mut self, other: IngestionSummary) {
        self.documents_scanned += other.documents_scanned;
        self.documents_ingested += other.documents_ingested;
        self.documents_skipped += other.documents_skipped;
        self.sections_submitted += other.sections_submitted;
        self.sections_failed += other.sections_failed;
    }
}

impl fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} documents scanned, {} ingested, {} skipped; {} sections submitted, {} failed",
            self.documents_scanned,
            self.documents_ingested,
            self.documents_skipped,
            self.sections_submitted,
            self.sections_failed
        )
    }
}

/// Drives one traversal: every document the walker discovers is sectionized
/// and its sections are submitted to the sink, strictly in document order
/// then section order, with a configurable pause between files.
///
/// `run` never propagates an error: ingestion is a background batch job and
/// a failed traversal must not crash the surrounding scan. Failures are
/// logged and reflected in the returned [`IngestionSummary`].
pub struct IngestionPipeline {
    walker: RepoWalker,
    sectionizer: Sectionizer,
    sink: Arc<dyn SectionSink>,
    base_url: String,
    provenance_prefix: String,
    throttle: Duration,
    clock: Arc<dyn Clock>,
    tracker: Option<SeenTracker>,
}

impl IngestionPipeline {
    pub fn new(
        config: &IngestConfig,
        requester: RateLimitedRequester,
        sink: Arc<dyn SectionSink>,
    ) -> Result<Self, IngestError> {
        Ok(Self {
            walker: RepoWalker::new(requester, config),
            sectionizer: Sectionizer::new(&config.section_delimiter)?,
            sink,
            base_url: config.docs_base_url.clone(),
            provenance_prefix: config.provenance_prefix(),
            throttle: config.throttle,
            clock: Arc::new(SystemClock),
            tracker: None,
        })
    }

    /// Replaces the clock used for throttle pauses. Tests inject a manual
    /// clock here to run without real delays.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Enables skip-if-unchanged tracking.
    #[must_use]
    pub fn with_tracker(mut self, tracker: SeenTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Ingests every document reachable from `root`. Best effort: errors
    /// are logged at this boundary and never raised past it.
    pub async fn run(&self, root: &str) -> IngestionSummary {
        let mut summary = IngestionSummary::default();
        match self.run_inner(root, &mut summary).await {
            Ok(()) => info!(root, %summary, "ingestion finished"),
            Err(err) => error!(root, error = %err, %summary, "ingestion aborted"),
        }
        summary
    }

    async fn run_inner(
        &self,
        root: &str,
        summary: &mut IngestionSummary,
    ) -> Result<(), IngestError> {
        let documents = self.walker.list_documents(root).await?;
        let total = documents.len();
        info!(root, documents = total, "traversal complete");

        for (index, document) in documents.into_iter().enumerate() {
            summary.documents_scanned += 1;
            let source_url = self.provenance_url(&document.path);
            let digest = seen::fingerprint(&document.text);

            if let Some(tracker) = &self.tracker {
                if tracker.is_current(&source_url, &digest).await {
                    info!(%source_url, "unchanged since last ingestion; skipping");
                    summary.documents_skipped += 1;
                    continue;
                }
            }

            let sections = self.sectionizer.sectionize(&document.text);
            let mut submitted = 0usize;
            for (section_index, section) in sections.into_iter().enumerate() {
                let record = SectionRecord::new(
                    Uuid::new_v4().to_string(),
                    &source_url,
                    section_index,
                    section,
                );
                // Sections go out one at a time so a quota failure on
                // section N cannot race section N+1.
                match self.sink.submit(record).await {
                    Ok(()) => submitted += 1,
                    Err(err) => {
                        warn!(%source_url, section_index, error = %err, "section dropped");
                        summary.sections_failed += 1;
                    }
                }
            }
            summary.sections_submitted += submitted;

            // A document with no stored sections is not ingested: leaving
            // it out of the tracker lets the next run retry it.
            if submitted > 0 {
                summary.documents_ingested += 1;
                if let Some(tracker) = &self.tracker {
                    if let Err(err) = tracker.mark_ingested(&source_url, &digest).await {
                        warn!(%source_url, error = %err, "failed to persist seen state");
                    }
                }
            }

            if index + 1 < total {
                self.clock.sleep(self.throttle).await;
            }
        }

        Ok(())
    }

    /// Provenance URL: the base documentation URL plus the document path
    /// with the docs-root prefix stripped.
    fn provenance_url(&self, path: &str) -> String {
        let relative = path.strip_prefix(&self.provenance_prefix).unwrap_or(path);
        format!("{}{}", self.base_url, relative)
    }
}
