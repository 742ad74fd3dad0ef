use std::path::PathBuf;

use reqwest::StatusCode;
use tokio::time::Duration;

/// Why a single request to the search endpoint failed.
///
/// Every variant is retryable; the searcher picks its backoff from the
/// variant and gives up only when the retry ceiling is reached.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("token rejected (401)")]
    Unauthorized,

    #[error("rate limited (retry after: {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("API error: {0}")]
    Status(StatusCode),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl SearchError {
    /// Sort a transport error into the network class (connection refused,
    /// DNS failure, timeout) or the catch-all class.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            SearchError::Network(err)
        } else {
            SearchError::Request(err)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("GitHub token not provided, not found in {0} and GITHUB_TOKEN is unset")]
    Missing(PathBuf),

    #[error("failed to read token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is not a collection (no top-level 'item' array)")]
    NotACollection(PathBuf),
}
