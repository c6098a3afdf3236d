//! The marker protocol shared by the synthesizer, executor, and demuxer.
//!
//! The synthesized script and the capture pipeline agree on a handful of
//! bit-exact line formats: per-block START/END markers, the debug block
//! header, the background scratch-file path, and the background PID
//! variable name. They are defined here once so the three consumers can
//! never drift apart.

use once_cell::sync::Lazy;
use regex::Regex;

/// Substring identifying a block-open marker line.
pub const START_SUBSTRING: &str = "DOCCI_BLOCK_START_";
/// Substring identifying a block-close marker line.
pub const END_SUBSTRING: &str = "DOCCI_BLOCK_END_";
/// Line emitted by the script's cleanup trap; filtered from live stdout.
pub const CLEANUP_NOTICE: &str = "Cleaning up background processes";
/// Substring identifying a debug block-header line.
pub const DEBUG_HEADER_SUBSTRING: &str = "=== Code Block";
/// Exact prefix of a debug block-header line, as seen by the demuxer.
pub const DEBUG_HEADER_PREFIX: &str = "### === Code Block";

/// The whole-line open marker for block `index`.
#[must_use]
pub fn block_start(index: usize) -> String {
    format!("### DOCCI_BLOCK_START_{index} ###")
}

/// The whole-line close marker for block `index`.
#[must_use]
pub fn block_end(index: usize) -> String {
    format!("### DOCCI_BLOCK_END_{index} ###")
}

/// The debug header line for block `index` (debug log level only).
#[must_use]
pub fn debug_header(index: usize, language: &str, file: &str) -> String {
    format!("### === Code Block {index} ({language}) from {file} ===")
}

/// Scratch file a background block redirects its output to.
#[must_use]
pub fn background_log_path(index: usize) -> String {
    format!("/tmp/docci_bg_{index}.out")
}

/// Shell variable holding a background block's PID.
#[must_use]
pub fn background_pid_var(index: usize) -> String {
    format!("DOCCI_BG_PID_{index}")
}

fn marker_regex(pattern: &str) -> Regex {
    #[allow(clippy::expect_used)]
    Regex::new(pattern).expect("static marker pattern must compile")
}

/// Exact matcher for block-open marker lines, capturing the index.
pub static START_RE: Lazy<Regex> =
    Lazy::new(|| marker_regex(r"^### DOCCI_BLOCK_START_(\d+) ###$"));

/// Exact matcher for block-close marker lines, capturing the index.
pub static END_RE: Lazy<Regex> = Lazy::new(|| marker_regex(r"^### DOCCI_BLOCK_END_(\d+) ###$"));

/// Whether a live stdout line is internal plumbing to suppress.
///
/// The raw line is still captured for demuxing; only the live echo to the
/// user's terminal is filtered.
#[must_use]
pub fn is_internal_stdout_line(line: &str) -> bool {
    line.contains(START_SUBSTRING)
        || line.contains(END_SUBSTRING)
        || line.contains(CLEANUP_NOTICE)
        || line.contains(DEBUG_HEADER_SUBSTRING)
}
