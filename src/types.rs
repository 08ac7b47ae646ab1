use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A contiguous byte range of one file attributed to a single commit
///
/// Line and character ranges are zero-based and half-open. Within one file's
/// hunk list, hunks are ordered by `char_start` and each hunk ends where the
/// next one begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    #[serde(rename = "CommitID")]
    pub commit_id: String,
    #[serde(rename = "LineStart")]
    pub line_start: usize,
    #[serde(rename = "LineEnd")]
    pub line_end: usize,
    #[serde(rename = "CharStart")]
    pub char_start: usize,
    #[serde(rename = "CharEnd")]
    pub char_end: usize,
}

impl Hunk {
    /// Number of bytes covered by this hunk
    pub fn char_len(&self) -> usize {
        self.char_end.saturating_sub(self.char_start)
    }
}

/// Author identity, compared structurally by name and email
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Metadata for one revision, shared by every hunk that references it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Author")]
    pub author: Author,
    /// Summary line (git) or full description (mercurial)
    #[serde(rename = "Message", default)]
    pub message: String,
    /// When the change was originally authored, which may differ from a
    /// later-rewritten commit date
    #[serde(rename = "AuthorDate")]
    pub author_date: DateTime<FixedOffset>,
}

/// Character count attributed to each author within a query interval
pub type AuthorHistogram = HashMap<Author, usize>;

/// Blame result for a single file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileBlame {
    /// Hunks ordered by `char_start`
    pub hunks: Vec<Hunk>,
    /// Every commit referenced by `hunks`, keyed by id
    pub commits: HashMap<String, Commit>,
}

impl FileBlame {
    /// Total number of bytes covered by the hunks
    pub fn char_len(&self) -> usize {
        self.hunks.last().map(|h| h.char_end).unwrap_or(0)
    }

    /// Author histogram for `[char_start, char_end)` of this file
    pub fn query(&self, char_start: i64, char_end: i64) -> crate::error::Result<AuthorHistogram> {
        crate::query::blame_query(&self.hunks, &self.commits, char_start, char_end)
    }
}

/// Blame result for every tracked file of a repository at one revision
///
/// Every commit id referenced by a hunk is present in `commits`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryBlame {
    #[serde(rename = "Hunks", default)]
    pub hunks: HashMap<String, Vec<Hunk>>,
    #[serde(rename = "Commits", default)]
    pub commits: HashMap<String, Commit>,
}

impl RepositoryBlame {
    /// Merge one file's blame into the repository result
    ///
    /// The file's hunk list is assigned as-is. Commits are inserted only when
    /// their id is not already present, so the first writer wins.
    pub fn insert_file(&mut self, path: impl Into<String>, blame: FileBlame) {
        self.hunks.insert(path.into(), blame.hunks);
        for (id, commit) in blame.commits {
            self.commits.entry(id).or_insert(commit);
        }
    }

    /// Number of files with a recorded hunk list
    pub fn file_count(&self) -> usize {
        self.hunks.len()
    }

    /// Total number of hunks across all files
    pub fn total_hunks(&self) -> usize {
        self.hunks.values().map(Vec::len).sum()
    }

    /// Drop every file whose path contains one of `patterns`
    pub fn retain_unignored(&mut self, patterns: &[String]) {
        self.hunks
            .retain(|path, _| !crate::orchestrator::is_ignored(path, patterns));
    }

    /// Author histogram for `[char_start, char_end)` of one file
    pub fn query_file(
        &self,
        path: &str,
        char_start: i64,
        char_end: i64,
    ) -> crate::error::Result<AuthorHistogram> {
        let hunks = self
            .hunks
            .get(path)
            .ok_or_else(|| crate::error::QueryError::FileNotFound(path.to_string()))?;
        crate::query::blame_query(hunks, &self.commits, char_start, char_end)
    }
}
