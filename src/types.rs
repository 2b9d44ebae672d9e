//! Shared error type for the ingestion pipeline.

use thiserror::Error;

/// Errors surfaced by the ingestion pipeline and its collaborators.
///
/// Rate-limit rejections never appear here: the requester recovers from them
/// internally by waiting for the reported reset time. Everything else either
/// propagates to the pipeline boundary, where it is logged and swallowed, or
/// (for per-section storage failures) is logged and the traversal continues.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Any non-rate-limit failure from the GitHub API.
    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    /// Rate-limit retries hit the configured bound without a reset.
    #[error("rate limit retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// A contents listing entry that is neither a file nor a directory.
    #[error("unsupported entry type '{kind}' at {path}")]
    UnsupportedEntryType { path: String, kind: String },

    /// File content that could not be base64/UTF-8 decoded.
    #[error("failed to decode content of {path}: {reason}")]
    Decode { path: String, reason: String },

    /// A malformed or unparseable document or URL.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Embedding generation failure for a section.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Vector store failure.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
