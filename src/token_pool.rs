use std::env;
use std::path::Path;

use tracing::{debug, info};

use crate::error::TokenError;

/// Rotating set of GitHub API tokens.
///
/// The pool is never empty, so `current()` always has something to hand out.
#[derive(Debug, Clone)]
pub struct TokenPool {
    tokens: Vec<String>,
    index: usize,
}

impl TokenPool {
    /// Build a pool from raw credential strings. Blank entries are dropped;
    /// returns `None` if nothing usable is left.
    pub fn new<I, S>(tokens: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(Into::into)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.is_empty() {
            None
        } else {
            Some(TokenPool { tokens, index: 0 })
        }
    }

    /// Resolve credentials the way the CLI does: explicit tokens first, then
    /// the token file (one per line, `#` comments allowed), then
    /// `GITHUB_TOKEN` from the environment.
    pub fn resolve(explicit: &[String], token_file: &Path) -> Result<Self, TokenError> {
        if let Some(pool) = TokenPool::new(explicit.iter().cloned()) {
            debug!("Using {} token(s) from the command line", pool.len());
            return Ok(pool);
        }

        if token_file.exists() {
            let contents = std::fs::read_to_string(token_file).map_err(|source| TokenError::Io {
                path: token_file.to_path_buf(),
                source,
            })?;
            if let Some(pool) = TokenPool::from_lines(&contents) {
                info!(
                    "Loaded {} token(s) from {}",
                    pool.len(),
                    token_file.display()
                );
                return Ok(pool);
            }
        }

        let token = env::var("GITHUB_TOKEN").unwrap_or_default();
        TokenPool::new([token]).ok_or_else(|| TokenError::Missing(token_file.to_path_buf()))
    }

    fn from_lines(contents: &str) -> Option<Self> {
        TokenPool::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    pub fn current(&self) -> &str {
        &self.tokens[self.index]
    }

    /// Advance to the next token, wrapping around at the end.
    pub fn rotate(&mut self) -> &str {
        self.index = (self.index + 1) % self.tokens.len();
        debug!("Rotated to token {}/{}", self.index + 1, self.tokens.len());
        self.current()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Short, log-safe prefix of the active token.
    pub fn current_hint(&self) -> String {
        let token = self.current();
        let prefix: String = token.chars().take(4).collect();
        format!("{}...", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_is_rejected() {
        assert!(TokenPool::new(Vec::<String>::new()).is_none());
        assert!(TokenPool::new(["", "   "]).is_none());
    }

    #[test]
    fn test_rotation_is_circular() {
        let mut pool = TokenPool::new(["a", "b", "c"]).unwrap();
        let start = pool.current().to_string();
        for _ in 0..pool.len() {
            pool.rotate();
        }
        assert_eq!(pool.current(), start);
    }

    #[test]
    fn test_rotate_single_token() {
        let mut pool = TokenPool::new(["only"]).unwrap();
        assert_eq!(pool.rotate(), "only");
    }

    #[test]
    fn test_from_lines_skips_comments_and_blanks() {
        let pool = TokenPool::from_lines("# personal\nghp_one\n\n  ghp_two  \n").unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.current(), "ghp_one");
        let mut pool = pool;
        assert_eq!(pool.rotate(), "ghp_two");
    }

    #[test]
    fn test_explicit_tokens_win() {
        let pool = TokenPool::resolve(
            &["cli-token".to_string()],
            Path::new("/nonexistent/_github_token.txt"),
        )
        .unwrap();
        assert_eq!(pool.current(), "cli-token");
    }

    #[test]
    fn test_current_hint_truncates() {
        let pool = TokenPool::new(["ghp_secretvalue"]).unwrap();
        assert_eq!(pool.current_hint(), "ghp_...");
    }
}
