//! # GitHub Dork Helper
//!
//! Replays saved GitHub code-search URLs ("dorks") against the search API,
//! rotating through a pool of tokens and backing off on rate limits, and
//! records every query that turns up matches. Also ships a few filters for
//! trimming Postman collections down to unique API requests.
//!
//! ## Main Components
//!
//! - [`GitHubSearcher`]: runs the queries one at a time and logs hits
//! - [`TokenPool`]: the rotating set of API tokens
//! - [`extract_query`]: turns a saved search URL into the API query string
//! - [`collection`]: Postman collection dedupe / API / base-URL filters
//! - [`Args`]: command line arguments
//!
//! ## Example
//!
//! ```no_run
//! use github_dork_helper_lib::{
//!     GitHubSearcher, QueryDescriptor, SearchConfig, Shutdown, TokenPool,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let tokens = TokenPool::new(["ghp_first", "ghp_second"]).ok_or("no tokens")?;
//!     let shutdown = Shutdown::on_ctrl_c();
//!     let mut searcher = GitHubSearcher::new(SearchConfig::default(), tokens, shutdown)?;
//!
//!     let queries = vec![QueryDescriptor::from_url(
//!         "https://github.com/search?q=%22db_password%22+in:url%22example.com%22&type=code",
//!     )];
//!     let summary = searcher.run(&queries).await;
//!     println!("{}", summary);
//!
//!     Ok(())
//! }
//! ```

mod args;
pub mod collection;
mod config;
mod error;
mod github_searcher;
mod hit_log;
mod query;
mod rate_limit;
mod shutdown;
mod token_pool;

// Re-export main components for documentation and external use
pub use crate::args::{Args, CollectionCommand, CollectionFileArgs, Command, SearchArgs};
pub use crate::config::SearchConfig;
pub use crate::error::{CollectionError, SearchError, TokenError};
pub use crate::github_searcher::{GitHubSearcher, RunSummary, SearchItem, SearchResult};
pub use crate::hit_log::{Hit, HitLog, MinimalFormat};
pub use crate::query::{collect_input_files, extract_query, load_search_urls, QueryDescriptor};
pub use crate::rate_limit::RateLimitStatus;
pub use crate::shutdown::{Shutdown, ShutdownTrigger};
pub use crate::token_pool::TokenPool;
