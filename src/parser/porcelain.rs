//! Parser for `git blame --porcelain` output
//!
//! Porcelain output is a sequence of hunk groups. Each group starts with a
//! header `<sha> <orig-line> <final-line> <num-lines>`. The first time a
//! commit appears, the header is followed by a fixed metadata block before
//! the TAB-prefixed content line; afterwards only the content line follows.
//! Every further line of the group is a short `<sha> <orig> <final>` header
//! plus its content line.
//!
//! Offsets are measured in bytes. A content line carries a leading TAB and no
//! newline, so its length equals the length of the source line including the
//! newline that terminates it.

use super::LineCursor;
use crate::error::{ParseError, Result};
use crate::types::{Author, Commit, FileBlame, Hunk};
use chrono::{FixedOffset, Offset, TimeZone, Utc};

/// Metadata line indices relative to a new-commit header
const AUTHOR: usize = 1;
const AUTHOR_MAIL: usize = 2;
const AUTHOR_TIME: usize = 3;
const AUTHOR_TZ: usize = 4;
const SUMMARY: usize = 9;
const MARKER: usize = 10;

/// Layout of the block that follows a header for a commit not seen before
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockShape {
    /// Metadata, `filename`, content
    Normal,
    /// Metadata, `previous <sha> <path>`, `filename`, content
    Previous,
    /// Metadata, `boundary`, `filename`, content
    Boundary,
    /// Metadata and `filename` with no content line at all
    EmptyFile,
}

impl BlockShape {
    /// Decide the shape of the block at the cursor position
    fn detect(cursor: &LineCursor<'_>) -> Result<Self> {
        let (shape, content_idx) = match cursor.peek(MARKER) {
            Some(line) if line.starts_with(b"previous ") => (BlockShape::Previous, 12),
            Some(line) if line == b"boundary" => (BlockShape::Boundary, 12),
            _ => (BlockShape::Normal, 11),
        };

        let remaining = cursor.remaining();
        if remaining > content_idx {
            Ok(shape)
        } else if remaining == BlockShape::EmptyFile.len() {
            Ok(BlockShape::EmptyFile)
        } else {
            Err(ParseError::UnexpectedEof {
                remaining,
                context: format!("metadata block for {}", cursor.describe(0)),
            }
            .into())
        }
    }

    /// Total number of lines in the block, header and content line included
    pub fn len(self) -> usize {
        match self {
            BlockShape::Normal => 12,
            BlockShape::Previous | BlockShape::Boundary => 13,
            BlockShape::EmptyFile => 11,
        }
    }

    /// Index of the content line relative to the header, if there is one
    pub fn content_index(self) -> Option<usize> {
        match self {
            BlockShape::EmptyFile => None,
            shape => Some(shape.len() - 1),
        }
    }
}

/// Parse porcelain output for one file into hunks and the commits they reference
///
/// The output must not be empty; callers decide what an empty output means
/// for the file on disk.
pub fn parse_porcelain(output: &[u8]) -> Result<FileBlame> {
    let body = output.strip_suffix(b"\n").unwrap_or(output);
    let mut cursor = LineCursor::new(body);
    let mut blame = FileBlame::default();
    let mut char_offset = 0usize;

    while !cursor.is_empty() {
        let header = parse_header(cursor.line(0)?)?;
        let char_start = char_offset;

        let empty_file = if blame.commits.contains_key(&header.commit_id) {
            char_offset += content_line(&cursor, 1)?.len();
            cursor.advance(2);
            false
        } else {
            let shape = BlockShape::detect(&cursor)?;
            let commit = parse_commit(&cursor, &header.commit_id)?;
            if let Some(idx) = shape.content_index() {
                char_offset += content_line(&cursor, idx)?.len();
            }
            cursor.advance(shape.len());
            blame.commits.insert(header.commit_id.clone(), commit);
            shape == BlockShape::EmptyFile
        };

        if empty_file {
            tracing::debug!("Porcelain output describes an empty file");
            blame.hunks.push(Hunk {
                commit_id: header.commit_id,
                line_start: 0,
                line_end: 0,
                char_start: 0,
                char_end: 0,
            });
            continue;
        }

        for _ in 1..header.num_lines {
            char_offset += content_line(&cursor, 1)?.len();
            cursor.advance(2);
        }

        let line_start = header.final_line.saturating_sub(1);
        blame.hunks.push(Hunk {
            commit_id: header.commit_id,
            line_start,
            line_end: line_start + header.num_lines,
            char_start,
            char_end: char_offset,
        });
    }

    Ok(blame)
}

struct Header {
    commit_id: String,
    final_line: usize,
    num_lines: usize,
}

fn parse_header(line: &[u8]) -> Result<Header> {
    let text = String::from_utf8_lossy(line);
    let fields: Vec<&str> = text.split(' ').collect();
    if fields.len() != 4 {
        return Err(ParseError::MalformedHeader(text.into_owned()).into());
    }

    let number = |idx: usize, field: &str| -> Result<usize> {
        fields[idx].parse().map_err(|_| {
            ParseError::InvalidField {
                field: field.to_string(),
                line: text.to_string(),
            }
            .into()
        })
    };

    Ok(Header {
        commit_id: fields[0].to_string(),
        final_line: number(2, "final line number")?,
        num_lines: number(3, "group line count")?,
    })
}

/// The content line at `idx`, which must carry the porcelain TAB prefix
fn content_line<'a>(cursor: &LineCursor<'a>, idx: usize) -> Result<&'a [u8]> {
    let line = cursor.line(idx)?;
    if !line.starts_with(b"\t") {
        return Err(ParseError::InvalidField {
            field: "content line".to_string(),
            line: String::from_utf8_lossy(line).into_owned(),
        }
        .into());
    }
    Ok(line)
}

fn parse_commit(cursor: &LineCursor<'_>, commit_id: &str) -> Result<Commit> {
    let name = field_value(cursor.line(AUTHOR)?);
    let email = strip_angle_brackets(&field_value(cursor.line(AUTHOR_MAIL)?)).to_string();

    let time_line = cursor.line(AUTHOR_TIME)?;
    let invalid_time = || ParseError::InvalidField {
        field: "author-time".to_string(),
        line: String::from_utf8_lossy(time_line).into_owned(),
    };
    let seconds: i64 = field_value(time_line)
        .parse()
        .map_err(|_| invalid_time())?;

    let offset = parse_tz_offset(&field_value(cursor.line(AUTHOR_TZ)?)).unwrap_or(Utc.fix());
    let author_date = offset
        .timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(invalid_time)?;

    Ok(Commit {
        id: commit_id.to_string(),
        author: Author { name, email },
        message: field_value(cursor.line(SUMMARY)?),
        author_date,
    })
}

/// Everything after the first space of a `key value` metadata line
fn field_value(line: &[u8]) -> String {
    let text = String::from_utf8_lossy(line);
    match text.split_once(' ') {
        Some((_, value)) => value.to_string(),
        None => String::new(),
    }
}

/// Strip `<` and `>` only when both are present
pub(crate) fn strip_angle_brackets(email: &str) -> &str {
    email
        .strip_prefix('<')
        .and_then(|e| e.strip_suffix('>'))
        .unwrap_or(email)
}

/// Parse a `+hhmm` / `-hhmm` timezone field
fn parse_tz_offset(tz: &str) -> Option<FixedOffset> {
    let (sign, digits) = match tz.as_bytes().first()? {
        b'+' => (1, &tz[1..]),
        b'-' => (-1, &tz[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
