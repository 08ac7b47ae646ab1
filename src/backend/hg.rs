use super::command::{run_command, split_nul};
use super::{BackendKind, VcsBackend, bridge};
use crate::config::Config;
use crate::error::Result;
use crate::message_cache::CommitMessageCache;
use crate::parser::parse_annotate;
use crate::types::{FileBlame, RepositoryBlame};
use std::path::Path;
use std::sync::Arc;

/// Mercurial backend driving the `hg` executable
///
/// Per-file blame uses `hg annotate` plus one `hg log` lookup per new
/// changeset, memoized in a shared [`CommitMessageCache`]. Repository-wide
/// blame goes through the python annotator in [`bridge`] instead.
#[derive(Debug, Clone)]
pub struct HgBackend {
    program: String,
    python_program: String,
    messages: Arc<CommitMessageCache>,
}

impl HgBackend {
    pub fn new(
        program: impl Into<String>,
        python_program: impl Into<String>,
        messages: Arc<CommitMessageCache>,
    ) -> Self {
        Self {
            program: program.into(),
            python_program: python_program.into(),
            messages,
        }
    }

    pub fn from_config(config: &Config, messages: Arc<CommitMessageCache>) -> Self {
        Self::new(
            config.commands.hg_program.clone(),
            config.commands.python_program.clone(),
            messages,
        )
    }

    /// Full log message of one changeset, through the shared cache
    pub fn commit_message(&self, repo: &Path, changeset: &str) -> Result<String> {
        self.messages.get_or_try_insert_with(repo, changeset, || {
            let output = run_command(
                &self.program,
                &["log", "-r", changeset, "--template", "{desc}"],
                repo,
            )?;
            Ok(String::from_utf8_lossy(&output).trim().to_string())
        })
    }

    /// Annotate a single path through the repository-wide annotator script
    pub fn annotate_repository_path(
        &self,
        repo: &Path,
        revision: &str,
        path: &str,
    ) -> Result<RepositoryBlame> {
        bridge::run_annotator(&self.python_program, &self.program, repo, revision, Some(path))
    }

    pub fn message_cache(&self) -> &Arc<CommitMessageCache> {
        &self.messages
    }
}

impl VcsBackend for HgBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mercurial
    }

    fn list_files(&self, repo: &Path, revision: &str) -> Result<Vec<String>> {
        let output = run_command(&self.program, &["locate", "--print0", "-r", revision], repo)?;
        let files = split_nul(&output);
        tracing::debug!("Listed {} files at {} in {}", files.len(), revision, repo.display());
        Ok(files)
    }

    fn annotate_file(&self, repo: &Path, path: &str, revision: &str) -> Result<FileBlame> {
        let output = run_command(
            &self.program,
            &["annotate", "-r", revision, "-nduvc", "--", path],
            repo,
        )?;
        parse_annotate(&output, |changeset| self.commit_message(repo, changeset))
    }

    fn annotate_repository(
        &self,
        repo: &Path,
        revision: &str,
        ignore_patterns: &[String],
        _max_concurrency: usize,
    ) -> Result<RepositoryBlame> {
        let mut blame = bridge::run_annotator(&self.python_program, &self.program, repo, revision, None)?;
        blame.retain_unignored(ignore_patterns);
        Ok(blame)
    }
}
