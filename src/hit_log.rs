use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clap::ValueEnum;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::github_searcher::SearchResult;
use crate::query::QueryDescriptor;

/// What goes into the minimal hit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MinimalFormat {
    /// One line per matching file URL.
    #[default]
    Items,
    /// One line per hit: the saved search URL that produced it.
    Source,
}

/// A query that returned at least one match.
#[derive(Debug, Clone)]
pub struct Hit {
    pub query: String,
    pub source_url: String,
    pub total_count: u64,
    pub urls: Vec<String>,
    pub timestamp: DateTime<Local>,
}

impl Hit {
    /// `None` when the result has nothing in it.
    pub fn from_result(descriptor: &QueryDescriptor, result: &SearchResult) -> Option<Self> {
        if result.total_count == 0 {
            return None;
        }
        Some(Hit {
            query: descriptor.query.clone(),
            source_url: descriptor.source_url.clone(),
            total_count: result.total_count,
            urls: result.items.iter().map(|item| item.html_url.clone()).collect(),
            timestamp: Local::now(),
        })
    }

    fn verbose_block(&self) -> String {
        let mut block = format!(
            "\n=== HIT ===\nQuery: {}\nResults: {}\n",
            self.query, self.total_count
        );
        for url in &self.urls {
            block.push_str(&format!("- {}\n", url));
        }
        block.push_str(&format!(
            "Time: {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.6f")
        ));
        block
    }

    fn minimal_lines(&self, format: MinimalFormat) -> String {
        match format {
            MinimalFormat::Items => self.urls.iter().map(|url| format!("{}\n", url)).collect(),
            MinimalFormat::Source => format!("{}\n", self.source_url),
        }
    }
}

/// The pair of append-only hit logs. Each write opens, appends, flushes and
/// closes the file.
#[derive(Debug, Clone)]
pub struct HitLog {
    verbose: PathBuf,
    minimal: PathBuf,
    format: MinimalFormat,
}

impl HitLog {
    pub fn new(verbose: PathBuf, minimal: PathBuf, format: MinimalFormat) -> Self {
        HitLog {
            verbose,
            minimal,
            format,
        }
    }

    pub fn verbose_path(&self) -> &Path {
        &self.verbose
    }

    pub fn minimal_path(&self) -> &Path {
        &self.minimal
    }

    /// Truncate both logs.
    pub async fn reset(&self) -> io::Result<()> {
        tokio::fs::write(&self.verbose, b"").await?;
        tokio::fs::write(&self.minimal, b"").await?;
        Ok(())
    }

    pub async fn record(&self, hit: &Hit) -> io::Result<()> {
        append(&self.verbose, &hit.verbose_block()).await?;
        append(&self.minimal, &hit.minimal_lines(self.format)).await
    }
}

async fn append(path: &Path, text: &str) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github_searcher::SearchItem;

    fn descriptor() -> QueryDescriptor {
        QueryDescriptor::from_url("https://github.com/search?q=%22db_password%22")
    }

    fn result(total_count: u64, urls: &[&str]) -> SearchResult {
        SearchResult {
            total_count,
            items: urls
                .iter()
                .map(|url| SearchItem {
                    html_url: url.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_zero_count_is_not_a_hit() {
        assert!(Hit::from_result(&descriptor(), &result(0, &[])).is_none());
    }

    #[test]
    fn test_verbose_block_layout() {
        let hit = Hit::from_result(&descriptor(), &result(2, &["https://a", "https://b"])).unwrap();
        let block = hit.verbose_block();
        assert!(block.starts_with("\n=== HIT ===\nQuery: \"db_password\"\nResults: 2\n"));
        assert!(block.contains("- https://a\n- https://b\n"));
        assert!(block.contains("Time: "));
    }

    #[tokio::test]
    async fn test_record_appends_both_logs() {
        let dir = tempfile::tempdir().unwrap();
        let log = HitLog::new(
            dir.path().join("verbose.txt"),
            dir.path().join("minimal.txt"),
            MinimalFormat::Items,
        );
        let hit = Hit::from_result(&descriptor(), &result(1, &["https://a"])).unwrap();
        log.record(&hit).await.unwrap();
        log.record(&hit).await.unwrap();

        let minimal = tokio::fs::read_to_string(log.minimal_path()).await.unwrap();
        assert_eq!(minimal, "https://a\nhttps://a\n");
        let verbose = tokio::fs::read_to_string(log.verbose_path()).await.unwrap();
        assert_eq!(verbose.matches("=== HIT ===").count(), 2);
    }

    #[tokio::test]
    async fn test_source_format_writes_search_url() {
        let dir = tempfile::tempdir().unwrap();
        let log = HitLog::new(
            dir.path().join("verbose.txt"),
            dir.path().join("minimal.txt"),
            MinimalFormat::Source,
        );
        let hit = Hit::from_result(&descriptor(), &result(3, &["https://a", "https://b"])).unwrap();
        log.record(&hit).await.unwrap();

        let minimal = tokio::fs::read_to_string(log.minimal_path()).await.unwrap();
        assert_eq!(minimal, "https://github.com/search?q=%22db_password%22\n");
    }
}
