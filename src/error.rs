/// Centralized error types for charblame using thiserror
///
/// Failures are grouped the way callers need to react to them: a VCS command
/// that could not run, output that did not match the expected grammar, a
/// query outside the covered range, or an inconsistent commit table.
use thiserror::Error;

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, BlameError>;

/// Main error type for blame computation and queries
#[derive(Error, Debug)]
pub enum BlameError {
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Annotator error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors raised while running an external VCS command
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to spawn '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("'{program} {args}' exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        args: String,
        status: String,
        stderr: String,
    },
}

/// Errors raised when annotation output does not match the expected grammar
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Expected 4 fields in hunk header, got: '{0}'")]
    MalformedHeader(String),

    #[error("Failed to parse {field} from line {line:?}")]
    InvalidField { field: String, line: String },

    #[error("Unexpected end of annotation output while reading {context} ({remaining} lines left)")]
    UnexpectedEof { remaining: usize, context: String },

    #[error("Annotation command produced no output for non-empty file: {0}")]
    EmptyOutput(String),

    #[error("Failed to match annotate line {0:?}")]
    UnmatchedLine(String),

    #[error("Invalid date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },
}

/// Errors raised by range queries over a hunk list
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Range {char_start}..{char_end} is out of range")]
    OutOfRange { char_start: i64, char_end: i64 },

    #[error("Commit {0} not found in commit table")]
    CommitNotFound(String),

    #[error("No blame recorded for file: {0}")]
    FileNotFound(String),
}

/// Errors raised by the auxiliary mercurial annotator
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to write annotator script: {0}")]
    ScriptWriteFailed(String),

    #[error("Failed to decode annotator output: {0}")]
    DecodeFailed(String),

    #[error("Annotator exited with {status}: {stderr}")]
    ExitFailed { status: String, stderr: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to input validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Repository path does not exist: {0}")]
    RepoNotFound(String),

    #[error("Repository path is not a directory: {0}")]
    NotADirectory(String),

    #[error("Empty {0}")]
    Empty(String),
}

impl From<anyhow::Error> for BlameError {
    fn from(err: anyhow::Error) -> Self {
        BlameError::Other(format!("{:#}", err))
    }
}

impl BlameError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        BlameError::Other(msg.into())
    }

    /// Check if this is a caller error (bad input or out-of-range query) rather than a system failure
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            BlameError::Validation(_)
                | BlameError::Query(QueryError::OutOfRange { .. })
                | BlameError::Query(QueryError::FileNotFound(_))
                | BlameError::Config(ConfigError::InvalidValue { .. })
        )
    }

    /// Check if the annotation output could not be understood
    pub fn is_parse_error(&self) -> bool {
        matches!(self, BlameError::Parse(_))
    }
}
