use std::fmt;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::hit_log::{Hit, HitLog};
use crate::query::QueryDescriptor;
use crate::rate_limit::{self, RateLimitResponse, RateLimitStatus};
use crate::shutdown::Shutdown;
use crate::token_pool::TokenPool;

const PROGRESS_TEMPLATE: &str =
    "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {prefix} {wide_msg}";

/// Body of a successful `GET /search/code`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub html_url: String,
}

/// Tally of one pass over the saved searches.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub hits: usize,
    pub empty: usize,
    pub abandoned: usize,
    pub skipped: usize,
    pub interrupted: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} executed, {} hit(s), {} empty, {} abandoned, {} skipped",
            self.executed, self.hits, self.empty, self.abandoned, self.skipped
        )?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}

pub struct GitHubSearcher {
    client: Client,
    config: SearchConfig,
    tokens: TokenPool,
    hit_log: HitLog,
    shutdown: Shutdown,
    progress: ProgressBar,
}

impl GitHubSearcher {
    /// Create a new GitHubSearcher instance
    pub fn new(
        config: SearchConfig,
        tokens: TokenPool,
        shutdown: Shutdown,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()?;

        let progress = if config.show_progress {
            let pb = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        Ok(GitHubSearcher {
            client,
            hit_log: config.hit_log(),
            config,
            tokens,
            shutdown,
            progress,
        })
    }

    pub fn tokens(&self) -> &TokenPool {
        &self.tokens
    }

    pub fn hit_log(&self) -> &HitLog {
        &self.hit_log
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.tokens.current()))
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Run every query once, in order.
    pub async fn run(&mut self, queries: &[QueryDescriptor]) -> RunSummary {
        let mut summary = RunSummary::default();
        self.progress.set_length(queries.len() as u64);
        info!(
            "Starting scan of {} search(es) (Token: {})",
            queries.len(),
            self.tokens.current_hint()
        );

        for descriptor in queries {
            if self.shutdown.is_triggered() {
                summary.interrupted = true;
                break;
            }

            if descriptor.is_empty() {
                warn!("No query in '{}', skipping", descriptor.source_url);
                summary.skipped += 1;
                self.progress.inc(1);
                continue;
            }

            // Back off before the search quota runs dry rather than after.
            let status = self.check_rate_limit().await;
            if status.is_search_exhausted() {
                let wait =
                    status.wait_until_reset(rate_limit::now_unix(), self.config.reset_margin);
                warn!(
                    "Approaching rate limit ({} left). Sleeping {:.1}s...",
                    status.search_remaining,
                    wait.as_secs_f64()
                );
                if self.wait(wait, "Search quota exhausted", true).await {
                    summary.interrupted = true;
                    break;
                }
            }

            self.run_query(descriptor, &mut summary).await;
            self.progress.inc(1);

            if self.wait(self.config.base_delay, "Pacing", true).await {
                summary.interrupted = true;
                break;
            }
        }

        self.progress.finish_and_clear();
        if summary.interrupted {
            info!("Scan interrupted: {}", summary);
        } else {
            info!("Scan complete: {}", summary);
        }
        summary
    }

    async fn run_query(&mut self, descriptor: &QueryDescriptor, summary: &mut RunSummary) {
        info!("Executing: {}", descriptor.query);
        self.progress.set_message(descriptor.query.clone());
        summary.executed += 1;

        let Some(result) = self.search(&descriptor.query).await else {
            summary.abandoned += 1;
            return;
        };

        match Hit::from_result(descriptor, &result) {
            Some(hit) => {
                info!("Found {} results for '{}'", hit.total_count, hit.query);
                summary.hits += 1;
                if let Err(e) = self.hit_log.record(&hit).await {
                    error!("Failed to log hit for '{}': {}", hit.query, e);
                }
            }
            None => {
                info!("No results for '{}'", descriptor.query);
                summary.empty += 1;
            }
        }
    }

    /// Ask the API how much search quota is left.
    ///
    /// A rejected token is rotated out and the call repeated, at most once
    /// per token in the pool. Any other failure yields
    /// [`RateLimitStatus::fallback`] so callers back off instead of guessing.
    pub async fn check_rate_limit(&mut self) -> RateLimitStatus {
        let mut rotations = 0;
        loop {
            match self.fetch_rate_limit().await {
                Ok(status) => {
                    debug!(
                        "Rate limit: search {} left (reset {}), core {} left",
                        status.search_remaining, status.search_reset, status.core_remaining
                    );
                    return status;
                }
                Err(SearchError::Unauthorized) if rotations < self.tokens.len() => {
                    warn!("Token {} rejected, rotating", self.tokens.current_hint());
                    self.tokens.rotate();
                    rotations += 1;
                }
                Err(e) => {
                    warn!("Rate limit check failed: {}", e);
                    return RateLimitStatus::fallback(rate_limit::now_unix());
                }
            }
        }
    }

    async fn fetch_rate_limit(&self) -> Result<RateLimitStatus, SearchError> {
        let response = self
            .authorized(self.client.get(self.config.rate_limit_url()))
            .send()
            .await
            .map_err(SearchError::from_transport)?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(SearchError::Unauthorized),
            status if !status.is_success() => return Err(SearchError::Status(status)),
            _ => {}
        }

        let body: RateLimitResponse = response
            .json()
            .await
            .map_err(SearchError::from_transport)?;
        Ok(body.into())
    }

    /// Search for `query`, retrying failures up to the configured ceiling.
    pub async fn search(&mut self, query: &str) -> Option<SearchResult> {
        self.search_with_retries(query, 0).await
    }

    /// Search for `query` as if `retry` attempts had already failed. Every
    /// failure, whatever its class, counts against the same ceiling.
    pub async fn search_with_retries(
        &mut self,
        query: &str,
        mut retry: u32,
    ) -> Option<SearchResult> {
        loop {
            if retry >= self.config.max_retries {
                error!("Max retries reached for: {}", query);
                return None;
            }

            match self.search_once(query).await {
                Ok(result) => return Some(result),
                Err(e) => {
                    warn!(
                        "Attempt {}/{} for '{}' failed: {}",
                        retry + 1,
                        self.config.max_retries,
                        query,
                        e
                    );
                    self.back_off(&e, retry).await;
                    retry += 1;
                }
            }
        }
    }

    async fn search_once(&self, query: &str) -> Result<SearchResult, SearchError> {
        debug!("Requesting {} q={}", self.config.search_url(), query);
        let response = self
            .authorized(self.client.get(self.config.search_url()).query(&[("q", query)]))
            .send()
            .await
            .map_err(SearchError::from_transport)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SearchError::Unauthorized);
        }
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimited {
                retry_after: rate_limit::retry_after(response.headers()),
            });
        }
        if !status.is_success() {
            return Err(SearchError::Status(status));
        }

        self.show_quota(response.headers());
        response.json().await.map_err(SearchError::from_transport)
    }

    /// Recover from a failed attempt: rotate the token or sleep, depending
    /// on what went wrong.
    async fn back_off(&mut self, error: &SearchError, retry: u32) {
        match error {
            SearchError::Unauthorized => {
                self.tokens.rotate();
                info!("Switched to token {}", self.tokens.current_hint());
            }
            SearchError::RateLimited { retry_after } => {
                let wait = match retry_after {
                    Some(hint) => *hint,
                    None => self
                        .check_rate_limit()
                        .await
                        .wait_until_reset(rate_limit::now_unix(), self.config.reset_margin),
                };
                warn!("Rate limit triggered. Sleeping {:.1}s...", wait.as_secs_f64());
                self.wait(wait, "Rate limited", false).await;
            }
            SearchError::Network(_) => {
                let wait = linear_backoff(self.config.network_error_delay, retry);
                self.wait(wait, "Network error", false).await;
            }
            SearchError::Status(_) | SearchError::Request(_) => {
                let wait = linear_backoff(self.config.base_delay, retry);
                self.wait(wait, "Retrying", false).await;
            }
        }
    }

    fn show_quota(&self, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        };
        if let (Some(remaining), Some(limit)) =
            (header("X-RateLimit-Remaining"), header("X-RateLimit-Limit"))
        {
            debug!("Search quota: {}/{}", remaining, limit);
            self.progress.set_prefix(format!("quota {}/{}", remaining, limit));
        }
    }

    /// Sleep with a countdown on the progress bar. Interruptible waits end
    /// early on shutdown and return `true`. Waits longer than
    /// `max_wait` are cut down to it.
    async fn wait(&mut self, duration: Duration, reason: &str, interruptible: bool) -> bool {
        let duration = if duration > self.config.max_wait {
            warn!(
                "{}: requested wait of {}s capped at {}s",
                reason,
                duration.as_secs(),
                self.config.max_wait.as_secs()
            );
            self.config.max_wait
        } else {
            duration
        };
        let Some(end) = Instant::now().checked_add(duration) else {
            warn!("{}: wait of {}s is out of range, not waiting", reason, duration.as_secs());
            return false;
        };
        let original_msg = self.progress.message();
        let mut interrupted = false;

        loop {
            let now = Instant::now();
            if now >= end {
                break;
            }
            let remaining = end - now;
            self.progress
                .set_message(format!("{} - waiting {}s", reason, remaining.as_secs()));

            let step = remaining.min(Duration::from_millis(500));
            if interruptible {
                if self.shutdown.sleep(step).await {
                    interrupted = true;
                    break;
                }
            } else {
                sleep(step).await;
            }
        }

        self.progress.set_message(original_msg);
        interrupted
    }
}

/// Wait before retry number `retry + 1`: `unit` times the attempt count.
fn linear_backoff(unit: Duration, retry: u32) -> Duration {
    unit.saturating_mul(retry.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff_grows_per_attempt() {
        let unit = Duration::from_millis(100);
        assert_eq!(linear_backoff(unit, 0), Duration::from_millis(100));
        assert_eq!(linear_backoff(unit, 1), Duration::from_millis(200));
        assert_eq!(linear_backoff(unit, 2), Duration::from_millis(300));
        assert_eq!(linear_backoff(Duration::ZERO, 5), Duration::ZERO);
    }

    #[test]
    fn test_linear_backoff_saturates() {
        assert_eq!(linear_backoff(Duration::MAX, 2), Duration::MAX);
    }

    #[test]
    fn test_quota_headers_reach_progress_prefix() {
        let (_trigger, shutdown) = Shutdown::channel();
        let tokens = TokenPool::new(["ghp_token"]).unwrap();
        let config = SearchConfig {
            show_progress: false,
            ..SearchConfig::default()
        };
        let searcher = GitHubSearcher::new(config, tokens, shutdown).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", "29".parse().unwrap());
        headers.insert("x-ratelimit-limit", "30".parse().unwrap());
        searcher.show_quota(&headers);

        assert_eq!(searcher.progress.prefix(), "quota 29/30");
        assert!(PROGRESS_TEMPLATE.contains("{prefix}"));
        assert!(ProgressStyle::with_template(PROGRESS_TEMPLATE).is_ok());
    }

    #[test]
    fn test_parse_search_result() {
        let body = r#"{
            "total_count": 2,
            "incomplete_results": false,
            "items": [
                {"name": "a.env", "html_url": "https://github.com/o/r/blob/main/a.env", "sha": "1"},
                {"name": "b.env", "html_url": "https://github.com/o/r/blob/main/b.env", "sha": "2"}
            ]
        }"#;
        let result: SearchResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.total_count, 2);
        assert_eq!(result.items[1].html_url, "https://github.com/o/r/blob/main/b.env");
    }

    #[test]
    fn test_parse_empty_search_result() {
        let result: SearchResult = serde_json::from_str(r#"{"total_count": 0}"#).unwrap();
        assert_eq!(result.total_count, 0);
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            executed: 3,
            hits: 1,
            empty: 1,
            abandoned: 1,
            skipped: 0,
            interrupted: true,
        };
        assert_eq!(
            summary.to_string(),
            "3 executed, 1 hit(s), 1 empty, 1 abandoned, 0 skipped (interrupted)"
        );
    }
}
