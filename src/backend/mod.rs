//! Version-control backends
//!
//! A backend knows how to list the files tracked at a revision and how to
//! annotate them. The active backend is chosen once per repository from its
//! layout: a `.hg` directory selects mercurial, anything else is treated as
//! git.

/// Auxiliary annotator script for repository-wide mercurial blame
pub mod bridge;
/// Blocking subprocess helpers shared by the backends
pub mod command;
/// `git ls-tree` / `git blame --porcelain`
pub mod git;
/// `hg locate` / `hg annotate`
pub mod hg;

pub use git::GitBackend;
pub use hg::HgBackend;

use crate::config::Config;
use crate::error::Result;
use crate::message_cache::CommitMessageCache;
use crate::types::{FileBlame, RepositoryBlame};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Which version-control system manages a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Git,
    Mercurial,
}

impl BackendKind {
    /// Probe the repository root for a mercurial metadata directory
    pub fn detect(repo: &Path) -> Self {
        if crate::paths::is_dir(&repo.join(".hg")) {
            BackendKind::Mercurial
        } else {
            BackendKind::Git
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Git => write!(f, "git"),
            BackendKind::Mercurial => write!(f, "mercurial"),
        }
    }
}

/// Capabilities every version-control backend provides
///
/// Implementations run blocking subprocesses and must be shareable across
/// the orchestrator's worker threads.
pub trait VcsBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// All regular files tracked at `revision`, relative to the repository root
    fn list_files(&self, repo: &Path, revision: &str) -> Result<Vec<String>>;

    /// Blame a single file at `revision`
    fn annotate_file(&self, repo: &Path, path: &str, revision: &str) -> Result<FileBlame>;

    /// Blame every tracked file at `revision`, skipping paths that contain
    /// any of `ignore_patterns`
    fn annotate_repository(
        &self,
        repo: &Path,
        revision: &str,
        ignore_patterns: &[String],
        max_concurrency: usize,
    ) -> Result<RepositoryBlame> {
        let files = self.list_files(repo, revision)?;
        crate::orchestrator::blame_files(self, repo, revision, &files, ignore_patterns, max_concurrency)
    }
}

/// Build the backend matching the repository layout
pub fn select_backend(
    repo: &Path,
    config: &Config,
    messages: Arc<CommitMessageCache>,
) -> Box<dyn VcsBackend> {
    let kind = BackendKind::detect(repo);
    tracing::debug!("Using {} backend for {}", kind, repo.display());
    match kind {
        BackendKind::Git => Box::new(GitBackend::from_config(config)),
        BackendKind::Mercurial => Box::new(HgBackend::from_config(config, messages)),
    }
}
