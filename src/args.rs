use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::hit_log::MinimalFormat;

/// GitHub dork helper: replay saved GitHub code-search URLs with token
/// rotation and rate-limit handling, and trim Postman collections.
#[derive(Parser)]
#[clap(
    author,
    version,
    about,
    long_about = "Replays saved GitHub code-search URLs against the search API, rotating tokens and backing off on rate limits, and filters Postman collections down to unique API requests."
)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every saved search URL and log the hits.
    Search(SearchArgs),

    /// Deduplicate and filter Postman collections.
    #[clap(subcommand)]
    Collection(CollectionCommand),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SearchArgs {
    /// Files or directories holding search URLs, one per line.
    /// Defaults to every *.txt file in the current directory.
    pub inputs: Vec<PathBuf>,

    /// GitHub API token. Repeat to build a rotation pool.
    #[clap(short, long = "token")]
    pub tokens: Vec<String>,

    /// File with one GitHub token per line.
    #[clap(long, default_value = "_github_token.txt")]
    pub token_file: PathBuf,

    /// Log with one block per hit (query, count, URLs, time).
    #[clap(long, default_value = "_hits_verbose.txt")]
    pub verbose_log: PathBuf,

    /// Log with one line per hit URL.
    #[clap(long, default_value = "_hits.txt")]
    pub minimal_log: PathBuf,

    /// What the minimal log records for each hit.
    #[clap(long, value_enum, default_value_t = MinimalFormat::Items)]
    pub minimal_format: MinimalFormat,

    /// Append to existing logs instead of truncating them at start.
    #[clap(long)]
    pub keep_logs: bool,

    /// Attempts per query before giving up on it.
    #[clap(long, default_value = "3")]
    pub max_retries: u32,

    /// Seconds to wait between queries; also the unit of the generic backoff.
    #[clap(long, value_name = "SECS", default_value = "2")]
    pub base_delay: u64,

    /// Seconds of backoff per attempt after a network failure.
    #[clap(long, value_name = "SECS", default_value = "10")]
    pub network_delay: u64,

    /// Longest single wait in seconds, however long the API asks for.
    #[clap(long, value_name = "SECS", default_value = "3600")]
    pub max_wait: u64,

    /// Per-request timeout in seconds.
    #[clap(long, value_name = "SECS", default_value = "30")]
    pub timeout: u64,

    /// GitHub API base URL.
    #[clap(long, default_value = "https://api.github.com")]
    pub api_url: String,

    /// Disable the progress bar.
    #[clap(long)]
    pub no_progress: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CollectionCommand {
    /// Remove requests whose URL (ignoring query and fragment) was already seen.
    Dedupe(CollectionFileArgs),

    /// Keep only requests that look like API endpoints.
    Api(CollectionFileArgs),

    /// Keep only requests sent to hosts matching a base URL fragment.
    Baseurl {
        #[clap(flatten)]
        file: CollectionFileArgs,

        /// Host fragment to keep (e.g. "registration-api").
        #[clap(long)]
        base_url: String,
    },

    /// Deduplicate, then keep only API requests.
    Pipeline {
        /// Path to the Postman collection JSON.
        collection_file: PathBuf,

        /// Directory for the derived files (defaults to the input's directory).
        #[clap(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CollectionFileArgs {
    /// Path to the Postman collection JSON.
    pub collection_file: PathBuf,

    /// Output path (defaults to a suffixed file next to the input).
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}
