//! Serde models for the GitHub REST payloads the pipeline consumes.

use serde::Deserialize;

/// One entry from a `contents` listing. Directory listings omit `content`;
/// single-file responses carry it base64 encoded.
#[derive(Clone, Debug, Deserialize)]
pub struct RepoEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl RepoEntry {
    pub fn is_file(&self) -> bool {
        self.entry_type == "file"
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == "dir"
    }
}

/// A `contents` response is an array when the path is a directory and a
/// bare object when it is a single file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ContentsResponse {
    Listing(Vec<RepoEntry>),
    Single(Box<RepoEntry>),
}

impl ContentsResponse {
    /// Normalizes both shapes to a sequence, preserving API order.
    pub fn into_entries(self) -> Vec<RepoEntry> {
        match self {
            ContentsResponse::Listing(entries) => entries,
            ContentsResponse::Single(entry) => vec![*entry],
        }
    }
}

/// One changed file from a pull-request files listing.
#[derive(Clone, Debug, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
    #[serde(default)]
    pub status: Option<String>,
}
