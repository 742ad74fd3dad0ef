use std::path::PathBuf;

use tokio::time::Duration;

use crate::args::SearchArgs;
use crate::hit_log::{HitLog, MinimalFormat};

/// Knobs for a search run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Base URL of the GitHub REST API, without a trailing slash.
    pub api_url: String,
    pub max_retries: u32,
    /// Pause between queries and unit of the generic backoff.
    pub base_delay: Duration,
    /// Unit of the backoff after connection failures and timeouts.
    pub network_error_delay: Duration,
    /// Added on top of every wait for a rate-limit reset.
    pub reset_margin: Duration,
    /// Upper bound on any single wait, whatever the server asks for.
    pub max_wait: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub verbose_log: PathBuf,
    pub minimal_log: PathBuf,
    pub minimal_format: MinimalFormat,
    pub keep_logs: bool,
    pub show_progress: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            api_url: "https://api.github.com".to_string(),
            max_retries: 3,
            base_delay: Duration::from_secs(2),
            network_error_delay: Duration::from_secs(10),
            reset_margin: Duration::from_secs(5),
            max_wait: Duration::from_secs(60 * 60),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("github-dork-helper/", env!("CARGO_PKG_VERSION")).to_string(),
            verbose_log: PathBuf::from("_hits_verbose.txt"),
            minimal_log: PathBuf::from("_hits.txt"),
            minimal_format: MinimalFormat::Items,
            keep_logs: false,
            show_progress: true,
        }
    }
}

impl SearchConfig {
    pub fn from_args(args: &SearchArgs) -> Self {
        SearchConfig {
            api_url: args.api_url.trim_end_matches('/').to_string(),
            max_retries: args.max_retries,
            base_delay: Duration::from_secs(args.base_delay),
            network_error_delay: Duration::from_secs(args.network_delay),
            request_timeout: Duration::from_secs(args.timeout),
            max_wait: Duration::from_secs(args.max_wait),
            verbose_log: args.verbose_log.clone(),
            minimal_log: args.minimal_log.clone(),
            minimal_format: args.minimal_format,
            keep_logs: args.keep_logs,
            show_progress: !args.no_progress,
            ..SearchConfig::default()
        }
    }

    pub fn hit_log(&self) -> HitLog {
        HitLog::new(
            self.verbose_log.clone(),
            self.minimal_log.clone(),
            self.minimal_format,
        )
    }

    pub fn rate_limit_url(&self) -> String {
        format!("{}/rate_limit", self.api_url)
    }

    pub fn search_url(&self) -> String {
        format!("{}/search/code", self.api_url)
    }
}
