use chrono::Utc;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Deserialize;
use tokio::time::Duration;

/// Seconds to wait when the status endpoint itself cannot be reached.
pub const FALLBACK_RESET_SECS: i64 = 60;

/// Snapshot of the quota reported by `GET /rate_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub search_remaining: u64,
    /// Unix timestamp (seconds) at which the search quota refills.
    pub search_reset: i64,
    pub core_remaining: u64,
}

impl RateLimitStatus {
    /// Pessimistic status used when the check fails: nothing left, reset in
    /// a minute.
    pub fn fallback(now: i64) -> Self {
        RateLimitStatus {
            search_remaining: 0,
            search_reset: now + FALLBACK_RESET_SECS,
            core_remaining: 0,
        }
    }

    pub fn is_search_exhausted(&self) -> bool {
        self.search_remaining <= 1
    }

    /// Time until the search quota resets, plus `margin`.
    pub fn wait_until_reset(&self, now: i64, margin: Duration) -> Duration {
        let secs = self.search_reset.saturating_sub(now).max(0) as u64;
        Duration::from_secs(secs).saturating_add(margin)
    }
}

impl From<RateLimitResponse> for RateLimitStatus {
    fn from(response: RateLimitResponse) -> Self {
        RateLimitStatus {
            search_remaining: response.resources.search.remaining,
            search_reset: response.resources.search.reset,
            core_remaining: response.resources.core.remaining,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RateLimitResponse {
    resources: Resources,
}

#[derive(Debug, Deserialize)]
struct Resources {
    core: Quota,
    search: Quota,
}

#[derive(Debug, Deserialize)]
struct Quota {
    remaining: u64,
    #[serde(default)]
    reset: i64,
}

/// Server-supplied `Retry-After` hint, in seconds. HTTP-date values are
/// converted relative to now.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let secs = at.timestamp().saturating_sub(Utc::now().timestamp()).max(0) as u64;
    Some(Duration::from_secs(secs))
}

pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}
