//! Core library client for charblame
//!
//! This module provides the main entry points for computing blame over a
//! repository and querying it by character range.

use crate::backend::{VcsBackend, select_backend};
use crate::config::Config;
use crate::error::{Result, ValidationError};
use crate::message_cache::CommitMessageCache;
use crate::types::*;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Main client for computing character-level blame
///
/// The backend is selected per call from the repository layout, so one
/// client can serve git and mercurial repositories alike. Mercurial commit
/// messages are memoized in a cache shared by every clone of the client.
///
/// # Example
///
/// ```no_run
/// use charblame::BlameClient;
/// use std::path::Path;
///
/// fn main() -> charblame::Result<()> {
///     let client = BlameClient::new()?;
///     let repo = Path::new("/path/to/repo");
///
///     let file = client.blame_file(repo, "src/main.rs", "HEAD")?;
///     let histogram = client.query(&file.hunks, &file.commits, 0, file.char_len() as i64)?;
///     for (author, chars) in histogram {
///         println!("{} <{}>: {}", author.name, author.email, chars);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct BlameClient {
    pub(crate) config: Arc<Config>,
    pub(crate) messages: Arc<CommitMessageCache>,
}

impl BlameClient {
    /// Create a new client from the config file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or is invalid
    pub fn new() -> Result<Self> {
        Ok(Self::with_config(Config::new()?))
    }

    /// Create a new client with a custom configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            messages: Arc::new(CommitMessageCache::new()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the shared mercurial commit-message cache
    pub fn message_cache(&self) -> &Arc<CommitMessageCache> {
        &self.messages
    }

    fn backend_for(&self, repo: &Path) -> Result<Box<dyn VcsBackend>> {
        crate::paths::validate_repo_path(repo)?;
        Ok(select_backend(repo, &self.config, Arc::clone(&self.messages)))
    }

    /// Blame a single file at `revision`
    ///
    /// `path` is relative to the repository root.
    pub fn blame_file(&self, repo: &Path, path: &str, revision: &str) -> Result<FileBlame> {
        if path.is_empty() {
            return Err(ValidationError::Empty("file path".to_string()).into());
        }
        if revision.is_empty() {
            return Err(ValidationError::Empty("revision".to_string()).into());
        }

        let backend = self.backend_for(repo)?;
        backend.annotate_file(repo, path, revision)
    }

    /// Blame every file tracked at `revision`
    ///
    /// Paths containing any of `ignore_patterns`, or any of the configured
    /// ignore patterns, are skipped.
    pub fn blame_repository(
        &self,
        repo: &Path,
        revision: &str,
        ignore_patterns: &[String],
    ) -> Result<RepositoryBlame> {
        if revision.is_empty() {
            return Err(ValidationError::Empty("revision".to_string()).into());
        }
        if ignore_patterns.iter().any(|p| p.is_empty()) {
            return Err(ValidationError::Empty("ignore pattern".to_string()).into());
        }

        let backend = self.backend_for(repo)?;
        tracing::info!(
            "Blaming repository {} at {} with {} backend",
            repo.display(),
            revision,
            backend.kind()
        );

        let patterns = self.merged_ignore_patterns(ignore_patterns);
        backend.annotate_repository(
            repo,
            revision,
            &patterns,
            self.config.blame.max_concurrency,
        )
    }

    /// Author histogram for `[char_start, char_end)` of one file's hunks
    pub fn query(
        &self,
        hunks: &[Hunk],
        commits: &HashMap<String, Commit>,
        char_start: i64,
        char_end: i64,
    ) -> Result<AuthorHistogram> {
        crate::query::blame_query(hunks, commits, char_start, char_end)
    }

    fn merged_ignore_patterns(&self, extra: &[String]) -> Vec<String> {
        let mut patterns = self.config.blame.ignore_patterns.clone();
        for pattern in extra {
            if !patterns.contains(pattern) {
                patterns.push(pattern.clone());
            }
        }
        patterns
    }
}

#[cfg(test)]
mod tests;
