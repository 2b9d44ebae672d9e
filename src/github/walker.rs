//! Depth-bounded traversal of a repository's documentation tree.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

use crate::config::IngestConfig;
use crate::github::models::{ContentsResponse, RepoEntry};
use crate::github::requester::RateLimitedRequester;
use crate::types::IngestError;

/// A fetched documentation file, decoded to UTF-8 text.
#[derive(Clone, Debug)]
pub struct DecodedDocument {
    pub path: String,
    pub text: String,
}

/// Walks a repository path through the contents API, collecting matching
/// files and decoding their payloads.
///
/// Traversal order follows the API's listing order; nothing is re-sorted.
/// Directory recursion is bounded by an explicit `max_depth` (default 1:
/// the root plus one nested level).
pub struct RepoWalker {
    requester: RateLimitedRequester,
    owner: String,
    repo: String,
    file_extension: String,
    max_depth: usize,
}

impl RepoWalker {
    pub fn new(requester: RateLimitedRequester, config: &IngestConfig) -> Self {
        Self {
            requester,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            file_extension: config.file_extension.clone(),
            max_depth: config.max_depth,
        }
    }

    /// Lists and decodes every document reachable from `root` within the
    /// depth bound. A root that names a single file yields that one
    /// document, which is what pull-request mode relies on.
    pub async fn list_documents(&self, root: &str) -> Result<Vec<DecodedDocument>, IngestError> {
        let files = self.collect_files(root, self.max_depth, false).await?;
        let mut documents = Vec::with_capacity(files.len());
        for entry in files {
            documents.push(self.fetch_document(&entry.path).await?);
        }
        Ok(documents)
    }

    /// Collects file entries under `path`, recursing into directories while
    /// `depth` allows. The extension filter applies below the root only:
    /// a root-level file was asked for by name and is kept as-is.
    async fn collect_files(
        &self,
        path: &str,
        depth: usize,
        filter_extension: bool,
    ) -> Result<Vec<RepoEntry>, IngestError> {
        let listing = self.list_contents(path).await?.into_entries();
        let mut kept = Vec::new();

        for entry in listing {
            if entry.is_file() {
                if filter_extension && !entry.name.ends_with(&self.file_extension) {
                    debug!(path = %entry.path, "skipping non-matching file");
                    continue;
                }
                kept.push(entry);
            } else if entry.is_dir() {
                if depth == 0 {
                    warn!(path = %entry.path, "directory beyond depth bound; skipping");
                    continue;
                }
                let nested = Box::pin(self.collect_files(&entry.path, depth - 1, true)).await?;
                kept.extend(nested);
            } else {
                return Err(IngestError::UnsupportedEntryType {
                    path: entry.path,
                    kind: entry.entry_type,
                });
            }
        }

        Ok(kept)
    }

    async fn list_contents(&self, path: &str) -> Result<ContentsResponse, IngestError> {
        let route = format!("/repos/{}/{}/contents/{}", self.owner, self.repo, path);
        let response = self.requester.get(&route, &[]).await?;
        Ok(response.json::<ContentsResponse>().await?)
    }

    /// Fetches one file's content and decodes its base64 payload as UTF-8.
    async fn fetch_document(&self, path: &str) -> Result<DecodedDocument, IngestError> {
        let entries = self.list_contents(path).await?.into_entries();
        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::InvalidDocument(format!("empty response for {path}")))?;
        let text = decode_content(&entry)?;
        debug!(path, bytes = text.len(), "decoded document");
        Ok(DecodedDocument {
            path: entry.path,
            text,
        })
    }
}

/// Decodes the base64 payload of a single-file contents response. GitHub
/// wraps the base64 across lines, so whitespace is stripped first.
fn decode_content(entry: &RepoEntry) -> Result<String, IngestError> {
    if let Some(encoding) = &entry.encoding {
        if encoding != "base64" {
            return Err(IngestError::Decode {
                path: entry.path.clone(),
                reason: format!("unexpected encoding '{encoding}'"),
            });
        }
    }
    let raw = entry.content.as_ref().ok_or_else(|| IngestError::Decode {
        path: entry.path.clone(),
        reason: "response carried no content field".to_string(),
    })?;
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(compact).map_err(|err| IngestError::Decode {
        path: entry.path.clone(),
        reason: err.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|err| IngestError::Decode {
        path: entry.path.clone(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(content: Option<&str>, encoding: Option<&str>) -> RepoEntry {
        RepoEntry {
            name: "a.md".to_string(),
            path: "docs/a.md".to_string(),
            entry_type: "file".to_string(),
            content: content.map(str::to_string),
            encoding: encoding.map(str::to_string),
        }
    }

    #[test]
    fn decodes_line_wrapped_base64() {
        // "hello docs" split across lines, as the contents API returns it.
        let wrapped = "aGVsbG8g\nZG9jcw==\n";
        let decoded = decode_content(&entry(Some(wrapped), Some("base64"))).unwrap();
        assert_eq!(decoded, "hello docs");
    }

    #[test]
    fn rejects_missing_content() {
        let err = decode_content(&entry(None, Some("base64"))).unwrap_err();
        assert!(matches!(err, IngestError::Decode { .. }));
    }

    #[test]
    fn rejects_unknown_encoding() {
        let err = decode_content(&entry(Some("aGk="), Some("utf-16"))).unwrap_err();
        assert!(matches!(err, IngestError::Decode { .. }));
    }
}
