//! Output demultiplexing and post-condition validation.
//!
//! After a run, the captured stdout is split around the per-block
//! START/END marker lines into a map from block index to that block's
//! trimmed output. Validation then checks every expected substring from
//! the script's validation map against the demuxed outputs, accumulating
//! errors rather than short-circuiting.

use std::collections::{BTreeMap, HashMap};

use crate::markers;

/// Error message produced when assert-failure blocks exist but the
/// script exited zero.
pub const ASSERT_FAILURE_SUCCEEDED: &str = "Expected script to fail with non-zero exit code due \
                                            to docci-assert-failure tag, but it succeeded";

/// Split captured stdout into per-block outputs.
///
/// Walks the capture line by line: an exact START marker opens a block
/// buffer, an exact END marker stores `trim(buffer)` under the open
/// index, debug block headers are skipped, and everything else is
/// appended to the open buffer (newline separated). Lines outside any
/// block are ignored.
#[must_use]
pub fn demux_block_outputs(stdout: &str) -> HashMap<usize, String> {
    let mut outputs = HashMap::new();
    let mut current_index = 0usize;
    let mut in_block = false;
    let mut buffer = String::new();

    for line in stdout.lines() {
        if let Some(caps) = markers::START_RE.captures(line) {
            current_index = caps[1].parse().unwrap_or(0);
            in_block = true;
            buffer.clear();
            continue;
        }
        if markers::END_RE.is_match(line) {
            if in_block {
                outputs.insert(current_index, buffer.trim().to_string());
                in_block = false;
            }
            continue;
        }
        if line.starts_with(markers::DEBUG_HEADER_PREFIX) {
            continue;
        }
        if in_block {
            if !buffer.is_empty() {
                buffer.push('\n');
            }
            buffer.push_str(line);
        }
    }

    outputs
}

/// Check every expected substring against the demuxed outputs.
///
/// Returns one error string per failed expectation; an empty vector means
/// all expectations held. A missing block output and a non-matching
/// output are distinct errors, and both carry the expected value.
#[must_use]
pub fn validate_outputs(
    outputs: &HashMap<usize, String>,
    validation_map: &BTreeMap<usize, String>,
) -> Vec<String> {
    let mut errors = Vec::new();
    for (index, expected) in validation_map {
        match outputs.get(index) {
            None => errors.push(format!(
                "block {index}: no captured output to search for '{expected}'"
            )),
            Some(actual) if !actual.contains(expected) => errors.push(format!(
                "block {index}: expected output to contain '{expected}', got: '{actual}'"
            )),
            Some(_) => {},
        }
    }
    errors
}
