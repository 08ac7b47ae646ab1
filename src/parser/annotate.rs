//! Parser for `hg annotate -nduvc` output
//!
//! Each output line is
//! `<author> <<email>> <rev> <changeset> <date>: <content>` and describes one
//! line of the file, in file order. Consecutive lines from the same
//! changeset are grouped into one hunk.

use crate::error::{ParseError, Result};
use crate::types::{Author, Commit, FileBlame, Hunk};
use chrono::{DateTime, FixedOffset};
use regex::bytes::Regex;
use std::sync::LazyLock;

static ANNOTATE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?-u)^\s*(.*)\s+(<[^ >]+[ >]?)\s*\d+\s*([0-9a-f]+)\s*([^:]*:[^:]*:[^:]*):(.*)$",
    )
    .expect("annotate line pattern is valid")
});

/// Date layout printed by `hg annotate -d`
const HG_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y %z";

const BINARY_MARKER: &[u8] = b": binary file";

/// One successfully matched annotate line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotateLine {
    pub author: Author,
    pub changeset: String,
    pub date: DateTime<FixedOffset>,
    /// Bytes this line occupies in the file, newline included
    pub byte_len: usize,
}

/// Parse a single annotate line
///
/// Returns `Ok(None)` for lines that carry no attribution: empty lines and
/// the marker hg prints for binary files.
pub fn parse_annotate_line(line: &[u8]) -> Result<Option<AnnotateLine>> {
    if line.is_empty() {
        return Ok(None);
    }

    let Some(caps) = ANNOTATE_LINE.captures(line) else {
        if contains(line, BINARY_MARKER) {
            return Ok(None);
        }
        return Err(ParseError::UnmatchedLine(String::from_utf8_lossy(line).into_owned()).into());
    };

    let text = |idx: usize| String::from_utf8_lossy(&caps[idx]).into_owned();

    let email = text(2).replace(['<', '>'], "").trim().to_string();

    let date_str = text(4);
    let date = DateTime::parse_from_str(date_str.trim(), HG_DATE_FORMAT).map_err(|e| {
        ParseError::InvalidDate {
            value: date_str.clone(),
            reason: e.to_string(),
        }
    })?;

    // hg separates the prefix from the content with ": "
    let content_len = caps[5].len().saturating_sub(1);

    Ok(Some(AnnotateLine {
        author: Author {
            name: text(1).trim().to_string(),
            email,
        },
        changeset: text(3),
        date,
        byte_len: content_len + 1,
    }))
}

/// Parse annotate output for one file
///
/// `describe` is called once per distinct changeset to fetch its full log
/// message; later lines from the same changeset reuse the recorded commit.
pub fn parse_annotate<F>(output: &[u8], mut describe: F) -> Result<FileBlame>
where
    F: FnMut(&str) -> Result<String>,
{
    let mut blame = FileBlame::default();
    let mut current: Option<Hunk> = None;
    let mut char_offset = 0usize;
    let mut line_no = 0usize;

    // Only `\n` separates lines. A `\r` before it belongs to the file content.
    for raw in output.split(|&b| b == b'\n') {
        let Some(line) = parse_annotate_line(raw)? else {
            continue;
        };

        if !blame.commits.contains_key(&line.changeset) {
            let message = describe(&line.changeset)?;
            blame.commits.insert(
                line.changeset.clone(),
                Commit {
                    id: line.changeset.clone(),
                    author: line.author,
                    message,
                    author_date: line.date,
                },
            );
        }

        match current.as_mut() {
            Some(hunk) if hunk.commit_id == line.changeset => {
                hunk.line_end += 1;
                hunk.char_end += line.byte_len;
            }
            _ => {
                blame.hunks.extend(current.take());
                current = Some(Hunk {
                    commit_id: line.changeset,
                    line_start: line_no,
                    line_end: line_no + 1,
                    char_start: char_offset,
                    char_end: char_offset + line.byte_len,
                });
            }
        }

        char_offset += line.byte_len;
        line_no += 1;
    }
    blame.hunks.extend(current);

    Ok(blame)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
