//! # docci-core
//!
//! Core functionality for docci - a documentation-as-tests runner that
//! keeps README example commands honest.
//!
//! Given one or more Markdown documents, docci-core extracts annotated
//! shell code blocks, assembles them into a single bash program that
//! preserves document order (with cleanup traps, per-block markers, retry
//! wrappers, background supervision, endpoint polling, and file-edit
//! operations), executes that program in one shell subprocess while
//! streaming output live, and then verifies post-conditions: expected
//! output substrings and expected failures.
//!
//! ## Architecture
//!
//! The pipeline is linear:
//!
//! 1. **Scanning** ([`parser`]): Markdown fences become typed [`Block`]s
//!    carrying a [`Directives`] set parsed from `docci-*` tags ([`tags`]).
//! 2. **Synthesis** ([`synth`]): blocks render deterministically into one
//!    [`Script`] with validation side tables.
//! 3. **Execution** ([`executor`]): one `bash -c` subprocess, two
//!    concurrent stream readers, full capture.
//! 4. **Demux & validation** ([`demux`]): captured stdout splits around
//!    per-block markers ([`markers`]) and assertions run.
//!
//! [`runner`] orchestrates the stages across multiple documents; all
//! foreground blocks of all documents execute in one shell invocation so
//! exported variables, cwd, and `set -e` semantics persist throughout.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use docci_core::{LogSink, RunOptions, Runner};
//!
//! # async fn example() -> docci_core::Result<()> {
//! let runner = Runner::new(RunOptions::default(), LogSink::default());
//! let result = runner.run(&["README.md".into()]).await?;
//! if result.success() {
//!     println!("documentation still works");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error handling
//!
//! Fallible operations return [`Result<T, Error>`]. Parse errors halt a
//! run before anything executes; script failures and validation failures
//! are ordinary data on [`RunResult`], because a `docci-assert-failure`
//! block makes a non-zero exit the expected outcome.

/// Output demultiplexing and post-condition validation
pub mod demux;
/// Error types and result aliases
pub mod error;
/// Shell execution with concurrent output streaming
pub mod executor;
/// Log-sink capability passed to each component
pub mod logging;
/// The bit-exact marker protocol
pub mod markers;
/// Markdown scanning and fence-line tag parsing
pub mod parser;
/// Run orchestration across documents
pub mod runner;
/// The synthesized script value and its side tables
pub mod script;
/// Script synthesis from parsed blocks
pub mod synth;
/// The static tag-definition table
pub mod tags;
/// Core data types: directives, blocks, typed values
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use executor::{ExecOptions, ExecutionOutcome, Executor, RUNNER_ENV_VAR};
pub use logging::{LogLevel, LogSink};
pub use parser::DocumentScanner;
pub use runner::{RunOptions, RunResult, Runner, RETRY_DELAY_ENV_VAR};
pub use script::Script;
pub use synth::{SynthOptions, Synthesizer, DEFAULT_RETRY_DELAY_SECS};
pub use tags::{TagSpec, TagValueKind, TAG_SPECS};
pub use types::{Block, Directives, EndpointSpec, LineRange, ReplaceSpec};
