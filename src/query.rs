//! Author histograms over byte ranges of a blamed file

use crate::error::{QueryError, Result};
use crate::types::{AuthorHistogram, Commit, Hunk};
use std::collections::HashMap;

/// Count how many bytes of `[char_start, char_end)` each author owns
///
/// `hunks` must be sorted by `char_start` and contiguous, as produced by the
/// parsers. Both bounds must fall inside the range the hunks cover; a
/// zero-width query inside that range yields an empty histogram.
///
/// # Examples
///
/// ```
/// use charblame::query::blame_query;
/// use charblame::types::{Author, Commit, Hunk};
/// use chrono::DateTime;
/// use std::collections::HashMap;
///
/// let hunks = vec![Hunk {
///     commit_id: "a1".to_string(),
///     line_start: 0,
///     line_end: 1,
///     char_start: 0,
///     char_end: 6,
/// }];
/// let mut commits = HashMap::new();
/// commits.insert(
///     "a1".to_string(),
///     Commit {
///         id: "a1".to_string(),
///         author: Author::new("Bob", "bob@bob.com"),
///         message: String::new(),
///         author_date: DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z").unwrap(),
///     },
/// );
///
/// let histogram = blame_query(&hunks, &commits, 1, 4).unwrap();
/// assert_eq!(histogram[&Author::new("Bob", "bob@bob.com")], 3);
/// ```
pub fn blame_query(
    hunks: &[Hunk],
    commits: &HashMap<String, Commit>,
    char_start: i64,
    char_end: i64,
) -> Result<AuthorHistogram> {
    let out_of_range = || QueryError::OutOfRange {
        char_start,
        char_end,
    };

    if char_start < 0 || char_end < 0 {
        return Err(out_of_range().into());
    }
    let (start, end) = (char_start as usize, char_end as usize);

    // First hunk extending past the query start, and first hunk reaching the query end.
    let start_idx = hunks.partition_point(|h| h.char_end <= start);
    let end_idx = hunks.partition_point(|h| h.char_end < end);
    if start_idx == hunks.len() || end_idx == hunks.len() {
        return Err(out_of_range().into());
    }

    let mut histogram = AuthorHistogram::new();
    for hunk in hunks.iter().take(end_idx + 1).skip(start_idx) {
        let clipped_start = hunk.char_start.max(start);
        let clipped_end = hunk.char_end.min(end);
        if clipped_end <= clipped_start {
            continue;
        }

        let commit = commits
            .get(&hunk.commit_id)
            .ok_or_else(|| QueryError::CommitNotFound(hunk.commit_id.clone()))?;
        *histogram.entry(commit.author.clone()).or_insert(0) += clipped_end - clipped_start;
    }

    Ok(histogram)
}
