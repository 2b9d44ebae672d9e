//! GitHub API collaborators: rate-limited requests, contents traversal,
//! and the serde models both share.

pub mod models;
pub mod requester;
pub mod walker;

pub use models::{ContentsResponse, PullRequestFile, RepoEntry};
pub use requester::{Clock, ManualClock, RateLimitedRequester, SystemClock};
pub use walker::{DecodedDocument, RepoWalker};
