//! Error types and handling for docci-core operations.
//!
//! This module provides the error type covering all failures in the
//! documentation-test pipeline. Errors are categorized along the stages of
//! a run:
//!
//! - **Parse errors**: malformed tags, invalid typed values, illegal tag
//!   combinations, dangling `docci-background-kill` references
//! - **Missing input**: documents or working directories that do not exist
//! - **Spawn errors**: the shell could not be launched or its pipes opened
//! - **Execution errors**: unexpected failures while waiting on the shell
//! - **Configuration errors**: malformed environment settings
//!
//! Script failures (a non-zero exit) and validation failures (a missing
//! expected substring) are *not* errors of this type: they are ordinary
//! data on [`RunResult`](crate::runner::RunResult), because an expected
//! failure is a successful run.

use thiserror::Error;

/// The main error type for docci-core operations.
///
/// All public fallible functions in docci-core return `Result<T, Error>`.
/// `Display` gives user-facing messages; parse errors carry the source
/// document and line so the CLI can point at the offending fence.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers reading input documents and other filesystem access. The
    /// underlying `std::io::Error` is preserved.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be parsed.
    ///
    /// Raised for unknown tags, malformed typed values, illegal tag
    /// combinations, unterminated fences, and `docci-background-kill`
    /// references to blocks that are not background blocks. Always halts
    /// the run before anything executes.
    #[error("Parse error at {file}:{line}: {message}")]
    Parse {
        /// Source document the error was found in.
        file: String,
        /// 1-based line number of the offending fence opener.
        line: usize,
        /// Human-readable description of the problem.
        message: String,
    },

    /// A requested input was not found.
    ///
    /// Used for missing input documents and missing working directories.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The shell subprocess could not be launched.
    ///
    /// Covers a missing `bash` binary and unobtainable stdio pipes. This
    /// is unrecoverable for the run.
    #[error("Failed to launch shell: {0}")]
    Spawn(String),

    /// Waiting on the shell subprocess failed unexpectedly.
    #[error("Execution error: {0}")]
    Execution(String),

    /// A process-wide setting is invalid.
    ///
    /// Raised for malformed environment configuration such as a
    /// non-numeric `DOCCI_RETRY_DELAY`.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a parse error, substituting a placeholder for unnamed input.
    pub(crate) fn parse(file: Option<&str>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.unwrap_or("<input>").to_string(),
            line,
            message: message.into(),
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Useful for grouping errors in logs. Returns one of `"io"`,
    /// `"parse"`, `"not_found"`, `"spawn"`, `"execution"`, `"config"`.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Parse { .. } => "parse",
            Self::NotFound(_) => "not_found",
            Self::Spawn(_) => "spawn",
            Self::Execution(_) => "execution",
            Self::Config(_) => "config",
        }
    }

    /// Whether this error was produced before anything executed.
    #[must_use]
    pub const fn is_pre_execution(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::NotFound(_) | Self::Config(_)
        )
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
