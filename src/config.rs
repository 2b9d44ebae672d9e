//! Immutable configuration for an ingestion run.
//!
//! Configuration is a plain value: nothing in the pipeline mutates it. The
//! traversal root is threaded through calls explicitly instead of living
//! here, so one config can back any number of traversals.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Settings shared by every component of an ingestion run.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Root path of the documentation tree inside the repository.
    pub docs_path: String,
    /// Extension filter applied to entries found inside directories.
    pub file_extension: String,
    /// Repeated-character token that marks a section boundary, e.g. `#`.
    pub section_delimiter: String,
    /// Base URL the provenance of each section is computed against.
    pub docs_base_url: String,
    /// Optional GitHub bearer token.
    pub github_token: Option<String>,
    /// Pause between files to stay under API rate limits.
    pub throttle: Duration,
    /// Upper bound on rate-limit retries per request. `None` keeps retrying
    /// across successive rate-limit windows.
    pub max_retries: Option<u32>,
    /// Page size for pull-request file listings.
    pub per_page: u32,
    /// Directory recursion bound for the repository walk.
    pub max_depth: usize,
    /// Optional path for persisting already-ingested provenance URLs. When
    /// set, re-runs skip documents recorded there.
    pub seen_state: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            docs_path: "docs".to_string(),
            file_extension: ".md".to_string(),
            section_delimiter: "#".to_string(),
            docs_base_url: "https://example.com/".to_string(),
            github_token: None,
            throttle: Duration::from_millis(200),
            max_retries: None,
            per_page: 100,
            max_depth: 1,
            seen_state: None,
        }
    }
}

impl IngestConfig {
    /// Builds a config from environment variables, falling back to defaults
    /// for anything unset. `.env` loading is the caller's responsibility.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            owner: env::var("DOCSILO_OWNER").unwrap_or(defaults.owner),
            repo: env::var("DOCSILO_REPO").unwrap_or(defaults.repo),
            docs_path: env::var("DOCSILO_DOCS_PATH").unwrap_or(defaults.docs_path),
            file_extension: env::var("DOCSILO_EXTENSION").unwrap_or(defaults.file_extension),
            section_delimiter: env::var("DOCSILO_DELIMITER").unwrap_or(defaults.section_delimiter),
            docs_base_url: env::var("DOCSILO_BASE_URL").unwrap_or(defaults.docs_base_url),
            github_token: env::var("GITHUB_TOKEN").ok(),
            throttle: env::var("DOCSILO_THROTTLE_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.throttle),
            max_retries: env::var("DOCSILO_MAX_RETRIES")
                .ok()
                .and_then(|value| value.parse::<u32>().ok()),
            per_page: env::var("DOCSILO_PER_PAGE")
                .ok()
                .and_then(|value| value.parse::<u32>().ok())
                .unwrap_or(defaults.per_page),
            max_depth: defaults.max_depth,
            seen_state: env::var("DOCSILO_SEEN_STATE").ok().map(PathBuf::from),
        }
    }

    /// Prefix stripped from repository paths when computing provenance URLs.
    pub fn provenance_prefix(&self) -> String {
        format!("{}/", self.docs_path.trim_end_matches('/'))
    }
}
