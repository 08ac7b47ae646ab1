//! # charblame - Character-level blame for git and mercurial
//!
//! Attributes every byte of every file in a repository to the commit (and
//! author) that last changed it, and answers "who wrote this character
//! range?" queries over the result.
//!
//! ## Overview
//!
//! Line-oriented annotation output from the version-control system is
//! turned into contiguous, byte-offset [`Hunk`](types::Hunk)s. A range query
//! over those hunks returns how many characters each author contributed to
//! an arbitrary `[start, end)` slice of a file.
//!
//! ## Key Features
//!
//! - **Git**: parses `git blame --porcelain` output
//! - **Mercurial**: parses `hg annotate -nduvc` output, with commit messages
//!   looked up once per changeset and cached
//! - **Repository-wide blame**: files are annotated on a bounded worker pool
//!   and merged into one commit table
//! - **Range queries**: `O(log n)` lookup of the affected hunks
//!
//! ## Architecture
//!
//! ```text
//! BlameClient
//!     |  select_backend (.hg present?)
//!     v
//! GitBackend / HgBackend ---- list files ----> orchestrator (rayon pool)
//!     |                                             |
//!     |  git blame / hg annotate                    | per file
//!     v                                             v
//! parser::{porcelain, annotate} -----------> FileBlame ---> RepositoryBlame
//!                                                 |
//!                                                 v
//!                                          query::blame_query
//! ```
//!
//! ## Modules
//!
//! - [`client`]: high-level entry points
//! - [`backend`]: git and mercurial command drivers
//! - [`parser`]: annotation output parsers
//! - [`orchestrator`]: concurrent repository-wide blame
//! - [`query`]: character range queries
//! - [`message_cache`]: shared mercurial commit-message cache
//! - [`config`]: configuration management with environment variable support
//! - [`types`]: blame data model
//! - [`error`]: error types and result aliases
//! - [`paths`]: path utilities
//!
//! ## Usage Example
//!
//! ```no_run
//! use charblame::BlameClient;
//! use std::path::Path;
//!
//! fn main() -> charblame::Result<()> {
//!     let client = BlameClient::new()?;
//!     let blame = client.blame_repository(Path::new("."), "HEAD", &[])?;
//!
//!     for path in blame.hunks.keys() {
//!         let histogram = blame.query_file(path, 0, 10)?;
//!         println!("{}: {:?}", path, histogram);
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Version-control backends and backend selection
pub mod backend;

/// High-level client combining configuration, backends and queries
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// Process-wide cache of mercurial commit messages
pub mod message_cache;

/// Concurrent repository-wide blame
pub mod orchestrator;

/// Annotation output parsers
pub mod parser;

/// Platform paths and filesystem helpers
pub mod paths;

/// Character range queries over hunk lists
pub mod query;

/// Blame data model
pub mod types;

pub use client::BlameClient;
pub use config::Config;
pub use error::{BlameError, Result};
pub use types::{Author, AuthorHistogram, Commit, FileBlame, Hunk, RepositoryBlame};
