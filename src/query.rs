use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

// `in:url"107.0.0.1"` (and the bare `in:url107.0.0.1`) is how saved search
// URLs mangle the qualifier; the API wants `in:url:107.0.0.1`.
static IN_URL_QUALIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"in:url(?::"|:|")?([^\s"]+)"?"#).unwrap());

/// A search to replay: where it came from and the query the API will see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub source_url: String,
    pub query: String,
}

impl QueryDescriptor {
    pub fn from_url(url: &str) -> Self {
        QueryDescriptor {
            source_url: url.to_string(),
            query: extract_query(url),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }
}

/// Pull the `q` parameter out of a GitHub search URL, decoded and with the
/// `in:url` qualifier repaired. Returns an empty string when there is no
/// query to run.
pub fn extract_query(url: &str) -> String {
    let parsed = match Url::parse(url.trim()) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Unparsable search URL '{}': {}", url, e);
            return String::new();
        }
    };

    let raw = parsed
        .query_pairs()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();

    repair_qualifiers(raw.trim())
}

fn repair_qualifiers(query: &str) -> String {
    IN_URL_QUALIFIER
        .replace_all(query, "in:url:${1}")
        .into_owned()
}

/// Whether a line looks like a saved search URL (`http(s)://<host>/search?q=...`).
pub fn is_search_url(line: &str) -> bool {
    match Url::parse(line) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.path().trim_end_matches('/') == "/search"
                && url.query_pairs().any(|(key, _)| key == "q")
        }
        Err(_) => false,
    }
}

/// Work out which files hold search URLs. Directories (and the default of
/// the current directory when `inputs` is empty) contribute every `*.txt`
/// file they contain, minus anything in `exclude`.
pub async fn collect_input_files(
    inputs: &[PathBuf],
    exclude: &[PathBuf],
) -> io::Result<Vec<PathBuf>> {
    let excluded: Vec<PathBuf> = exclude.iter().map(|p| canonical(p)).collect();
    let roots = if inputs.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        inputs.to_vec()
    };

    let mut files = BTreeSet::new();
    for root in roots {
        if tokio::fs::metadata(&root).await?.is_dir() {
            let mut entries = tokio::fs::read_dir(&root).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let is_txt = path.extension().map(|ext| ext == "txt").unwrap_or(false);
                if is_txt
                    && entry.file_type().await?.is_file()
                    && !excluded.contains(&canonical(&path))
                {
                    files.insert(path);
                }
            }
        } else {
            files.insert(root);
        }
    }

    Ok(files.into_iter().collect())
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Read every search URL from `files`, deduplicated and in sorted order.
pub async fn load_search_urls(files: &[PathBuf]) -> io::Result<Vec<String>> {
    let mut urls = BTreeSet::new();
    for file in files {
        let contents = tokio::fs::read_to_string(file).await?;
        let before = urls.len();
        for line in contents.lines().map(str::trim) {
            if is_search_url(line) {
                urls.insert(line.to_string());
            }
        }
        if urls.len() == before {
            warn!("No search URLs found in {}", file.display());
        } else {
            debug!("{}: {} new search URL(s)", file.display(), urls.len() - before);
        }
    }
    Ok(urls.into_iter().collect())
}
