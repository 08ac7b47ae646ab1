//! Parsers turning VCS annotation output into hunks and commits
//!
//! Both parsers are pure: they take the raw command output and return a
//! [`FileBlame`](crate::types::FileBlame). Running the commands is the job of
//! the [`backend`](crate::backend) module.

/// Mercurial `hg annotate -nduvc` line format
pub mod annotate;
/// Git `git blame --porcelain` format
pub mod porcelain;

pub use annotate::parse_annotate;
pub use porcelain::{BlockShape, parse_porcelain};

use crate::error::{ParseError, Result};

/// Cursor over the lines of a command output, addressed relative to the current position
pub(crate) struct LineCursor<'a> {
    lines: Vec<&'a [u8]>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    /// Split `body` on `\n`; an empty body has no lines
    pub(crate) fn new(body: &'a [u8]) -> Self {
        let lines = if body.is_empty() {
            Vec::new()
        } else {
            body.split(|&b| b == b'\n').collect()
        };
        Self { lines, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn remaining(&self) -> usize {
        self.lines.len() - self.pos
    }

    pub(crate) fn peek(&self, offset: usize) -> Option<&'a [u8]> {
        self.lines.get(self.pos + offset).copied()
    }

    /// The line at `offset`, or an error if the output ends before it
    pub(crate) fn line(&self, offset: usize) -> Result<&'a [u8]> {
        self.peek(offset).ok_or_else(|| {
            ParseError::UnexpectedEof {
                remaining: self.remaining(),
                context: format!("line {} after {}", offset, self.describe(0)),
            }
            .into()
        })
    }

    pub(crate) fn advance(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.lines.len());
    }

    /// Lossy rendering of the line at `offset` for error messages
    pub(crate) fn describe(&self, offset: usize) -> String {
        match self.peek(offset) {
            Some(line) => format!("{:?}", String::from_utf8_lossy(line)),
            None => "end of output".to_string(),
        }
    }
}
