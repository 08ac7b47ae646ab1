use super::command::{run_command, split_nul};
use super::{BackendKind, VcsBackend};
use crate::config::Config;
use crate::error::{ParseError, Result};
use crate::parser::parse_porcelain;
use crate::types::FileBlame;
use std::path::Path;

/// Git backend driving the `git` executable
#[derive(Debug, Clone)]
pub struct GitBackend {
    program: String,
    ignore_whitespace: bool,
}

impl Default for GitBackend {
    fn default() -> Self {
        Self::new("git", true)
    }
}

impl GitBackend {
    pub fn new(program: impl Into<String>, ignore_whitespace: bool) -> Self {
        Self {
            program: program.into(),
            ignore_whitespace,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.commands.git_program.clone(),
            config.blame.ignore_whitespace,
        )
    }

    /// Arguments for `git blame` on one file
    fn blame_args<'a>(&self, path: &'a str, revision: &'a str) -> Vec<&'a str> {
        let mut args = vec!["blame"];
        if self.ignore_whitespace {
            args.push("-w");
        }
        args.extend(["--porcelain", revision, "--", path]);
        args
    }
}

impl VcsBackend for GitBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Git
    }

    fn list_files(&self, repo: &Path, revision: &str) -> Result<Vec<String>> {
        let output = run_command(
            &self.program,
            &["ls-tree", "-z", "-r", revision, "--name-only"],
            repo,
        )?;

        // Submodules are listed as paths too, and show up as directories in
        // the work tree. They cannot be blamed.
        let files: Vec<String> = split_nul(&output)
            .into_iter()
            .filter(|path| !crate::paths::is_dir(&repo.join(path)))
            .collect();

        tracing::debug!("Listed {} files at {} in {}", files.len(), revision, repo.display());
        Ok(files)
    }

    fn annotate_file(&self, repo: &Path, path: &str, revision: &str) -> Result<FileBlame> {
        let output = run_command(&self.program, &self.blame_args(path, revision), repo)?;

        if output.is_empty() {
            return match crate::paths::file_size(repo, path) {
                Some(0) => {
                    tracing::warn!("git blame produced no output for empty file {}", path);
                    Ok(FileBlame::default())
                }
                _ => Err(ParseError::EmptyOutput(path.to_string()).into()),
            };
        }

        parse_porcelain(&output)
    }
}
