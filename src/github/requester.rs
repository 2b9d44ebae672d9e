//! Rate-limit aware wrapper around GitHub API calls.
//!
//! Every request the walker and the pull-request scanner make goes through
//! [`RateLimitedRequester::get`]. On a 403 whose remaining-quota header is
//! zero, the requester waits until the reset time reported by the API and
//! re-issues the identical request; any other failure propagates unchanged.
//! Time is abstracted behind the [`Clock`] trait so retry waits can be
//! asserted in tests without real delays.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::header;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info};

use crate::types::IngestError;

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("docsilo/", env!("CARGO_PKG_VERSION"));

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Source of wall-clock time and timed suspension.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time as seconds since the UNIX epoch.
    fn now_epoch(&self) -> u64;

    /// Suspends the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by the system time and the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now_epoch(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic clock for tests: sleeping records the requested duration
/// and advances the epoch instantly instead of suspending.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
    slept: std::sync::Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn starting_at(epoch: u64) -> Self {
        Self {
            now: AtomicU64::new(epoch),
            slept: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Durations passed to [`Clock::sleep`], in call order.
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().expect("manual clock mutex poisoned").clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now_epoch(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    async fn sleep(&self, duration: Duration) {
        self.now.fetch_add(duration.as_secs(), Ordering::SeqCst);
        self.slept
            .lock()
            .expect("manual clock mutex poisoned")
            .push(duration);
    }
}

/// GitHub request wrapper with wait-and-retry rate-limit handling.
#[derive(Clone)]
pub struct RateLimitedRequester {
    http: Client,
    api_root: String,
    token: Option<String>,
    clock: Arc<dyn Clock>,
    max_retries: Option<u32>,
}

impl RateLimitedRequester {
    /// Creates a requester against the public GitHub API. `max_retries`
    /// bounds how many rate-limit waits a single request will tolerate;
    /// `None` keeps retrying across successive windows.
    pub fn new(http: Client, token: Option<String>, max_retries: Option<u32>) -> Self {
        Self {
            http,
            api_root: "https://api.github.com".to_string(),
            token,
            clock: Arc::new(SystemClock),
            max_retries,
        }
    }

    /// Points the requester at a different API root. Used by tests to talk
    /// to a local mock server.
    #[must_use]
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    /// Replaces the clock used for reset waits.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issues a GET against `path` (relative to the API root), recovering
    /// from rate-limit rejections by sleeping until the reported reset.
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response, IngestError> {
        let url = format!("{}{}", self.api_root, path);
        let mut attempts = 0u32;

        loop {
            let mut request = self
                .http
                .get(&url)
                .header(header::ACCEPT, "application/vnd.github+json")
                .header(header::USER_AGENT, USER_AGENT)
                .header("X-GitHub-Api-Version", API_VERSION)
                .query(query);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await?;
            let Some(reset_epoch) = rate_limit_reset(&response) else {
                debug!(%url, status = %response.status(), "github request completed");
                return Ok(response.error_for_status()?);
            };

            if let Some(bound) = self.max_retries {
                if attempts >= bound {
                    return Err(IngestError::RetriesExhausted { attempts });
                }
            }
            attempts += 1;

            let wait = retry_delay(reset_epoch, self.clock.now_epoch());
            info!(
                %url,
                wait_secs = wait.as_secs(),
                attempt = attempts,
                "rate limited; waiting for quota reset"
            );
            self.clock.sleep(wait).await;
        }
    }
}

/// Extracts the reset epoch when a response is a rate-limit rejection:
/// 403 with a zero remaining-quota header. Any other response, including
/// other 403s, is not a rate-limit rejection.
fn rate_limit_reset(response: &Response) -> Option<u64> {
    if response.status() != StatusCode::FORBIDDEN {
        return None;
    }
    let remaining = response.headers().get(REMAINING_HEADER)?.to_str().ok()?;
    if remaining.trim() != "0" {
        return None;
    }
    response
        .headers()
        .get(RESET_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Wait until the reported reset, clamped to zero when the reset is already
/// in the past.
fn retry_delay(reset_epoch: u64, now_epoch: u64) -> Duration {
    Duration::from_secs(reset_epoch.saturating_sub(now_epoch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_is_reset_minus_now() {
        assert_eq!(retry_delay(1_700_000_060, 1_700_000_000), Duration::from_secs(60));
    }

    #[test]
    fn retry_delay_clamps_past_resets_to_zero() {
        assert_eq!(retry_delay(1_700_000_000, 1_700_000_060), Duration::ZERO);
    }

    #[tokio::test]
    async fn manual_clock_records_and_advances() {
        let clock = ManualClock::starting_at(100);
        clock.sleep(Duration::from_secs(30)).await;
        clock.sleep(Duration::from_secs(5)).await;
        assert_eq!(clock.now_epoch(), 135);
        assert_eq!(
            clock.slept(),
            vec![Duration::from_secs(30), Duration::from_secs(5)]
        );
    }
}
