//! Incremental ingestion driven by a pull request's changed files.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::config::IngestConfig;
use crate::github::models::PullRequestFile;
use crate::github::requester::{Clock, RateLimitedRequester, SystemClock};
use crate::pipeline::ingest::{IngestionPipeline, IngestionSummary};
use crate::types::IngestError;

/// Scans one pull request's changed files and re-ingests the documentation
/// paths among them.
///
/// Each matching path becomes the pipeline's traversal root for one run,
/// which the walker handles through its single-file branch. The full
/// documentation tree is never re-walked.
pub struct PullRequestScanner {
    requester: RateLimitedRequester,
    pipeline: IngestionPipeline,
    owner: String,
    repo: String,
    docs_path: String,
    per_page: u32,
    throttle: Duration,
    clock: Arc<dyn Clock>,
}

impl PullRequestScanner {
    pub fn new(
        config: &IngestConfig,
        requester: RateLimitedRequester,
        pipeline: IngestionPipeline,
    ) -> Self {
        Self {
            requester,
            pipeline,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            docs_path: config.docs_path.clone(),
            per_page: config.per_page,
            throttle: config.throttle,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for the inter-file pause.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Ingests every changed documentation file of pull request `number`.
    /// Best effort, like [`IngestionPipeline::run`]: failures are logged,
    /// never raised.
    pub async fn scan_pull_request(&self, number: u64) -> IngestionSummary {
        let mut summary = IngestionSummary::default();
        match self.scan_inner(number, &mut summary).await {
            Ok(()) => info!(number, %summary, "pull request scan finished"),
            Err(err) => error!(number, error = %err, %summary, "pull request scan aborted"),
        }
        summary
    }

    async fn scan_inner(
        &self,
        number: u64,
        summary: &mut IngestionSummary,
    ) -> Result<(), IngestError> {
        let changed = self.list_changed_files(number).await?;
        let docs: Vec<&PullRequestFile> = changed
            .iter()
            .filter(|file| file.filename.contains(&self.docs_path))
            .collect();
        info!(
            number,
            changed = changed.len(),
            matching = docs.len(),
            "pull request files listed"
        );

        for (index, file) in docs.iter().enumerate() {
            summary.merge(self.pipeline.run(&file.filename).await);
            if index + 1 < docs.len() {
                self.clock.sleep(self.throttle).await;
            }
        }
        Ok(())
    }

    /// Pages through the changed-file listing until a short page signals
    /// the end.
    async fn list_changed_files(
        &self,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, IngestError> {
        let route = format!("/repos/{}/{}/pulls/{}/files", self.owner, self.repo, number);
        let mut files = Vec::new();
        let mut page = 1u32;

        loop {
            let query = [
                ("per_page", self.per_page.to_string()),
                ("page", page.to_string()),
            ];
            let response = self.requester.get(&route, &query).await?;
            let batch: Vec<PullRequestFile> = response.json().await?;
            let batch_len = batch.len();
            files.extend(batch);
            if batch_len < self.per_page as usize {
                break;
            }
            page += 1;
        }

        Ok(files)
    }
}
