//! Optional dedup tracking for repeated ingestion runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::Mutex;

use crate::types::IngestError;

/// SHA-256 fingerprint of a document's decoded text, hex encoded.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Persists, per provenance URL, the content fingerprint of the last
/// successfully ingested version of that document. Repeated runs skip a
/// document only while its content is unchanged; an edited document gets a
/// new fingerprint and is re-ingested.
///
/// This is a policy knob, not a guarantee: ingestion stays at-least-once,
/// and the tracker is only consulted when the pipeline is configured with
/// one.
#[derive(Clone, Debug)]
pub struct SeenTracker {
    path: PathBuf,
    state: Arc<Mutex<HashMap<String, String>>>,
}

impl SeenTracker {
    /// Creates a tracker that persists state to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads previously persisted fingerprints, if the state file exists.
    pub async fn load(&self) -> Result<(), IngestError> {
        if !self.path.exists() {
            return Ok(());
        }
        let data = fs::read_to_string(&self.path).await?;
        let entries: HashMap<String, String> = serde_json::from_str(&data)
            .map_err(|err| IngestError::InvalidDocument(err.to_string()))?;
        let mut guard = self.state.lock().await;
        guard.clear();
        guard.extend(entries);
        Ok(())
    }

    /// Returns `true` if this exact version of the document was already
    /// ingested: the URL is known and its recorded fingerprint matches.
    pub async fn is_current(&self, source_url: &str, fingerprint: &str) -> bool {
        let guard = self.state.lock().await;
        guard.get(source_url).map(String::as_str) == Some(fingerprint)
    }

    /// Records the fingerprint ingested for a provenance URL and persists
    /// the updated map.
    pub async fn mark_ingested(
        &self,
        source_url: &str,
        fingerprint: &str,
    ) -> Result<(), IngestError> {
        let mut guard = self.state.lock().await;
        let previous = guard.insert(source_url.to_string(), fingerprint.to_string());
        if previous.as_deref() == Some(fingerprint) && self.path.exists() {
            return Ok(());
        }
        let entries = guard.clone();
        drop(guard);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let serialized = serde_json::to_string(&entries)
            .map_err(|err| IngestError::InvalidDocument(err.to_string()))?;
        fs::write(&self.path, serialized).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn tracker_round_trips_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seen.json");
        let tracker = SeenTracker::new(&path);
        tracker.load().await.unwrap();

        let url = "https://example.com/guide/intro.md";
        let digest = fingerprint("original body");
        assert!(!tracker.is_current(url, &digest).await);

        tracker.mark_ingested(url, &digest).await.unwrap();
        assert!(tracker.is_current(url, &digest).await);

        let reloaded = SeenTracker::new(&path);
        reloaded.load().await.unwrap();
        assert!(reloaded.is_current(url, &digest).await);
    }

    #[tokio::test]
    async fn changed_content_is_not_current() {
        let dir = tempdir().unwrap();
        let tracker = SeenTracker::new(dir.path().join("seen.json"));

        let url = "https://example.com/guide/intro.md";
        tracker
            .mark_ingested(url, &fingerprint("version one"))
            .await
            .unwrap();

        assert!(!tracker.is_current(url, &fingerprint("version two")).await);
        assert!(tracker.is_current(url, &fingerprint("version one")).await);
    }
}
