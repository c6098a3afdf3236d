//! The synthesized script value.
//!
//! A [`Script`] is an append-only text buffer plus two side tables filled
//! in during synthesis: the validation map (block index → expected output
//! substring) and the assert-failure map (block index → true). The
//! synthesizer produces it; the executor consumes the text; the demuxer
//! consults the side tables afterwards.

use std::collections::BTreeMap;

/// One run's shell program and its post-condition side tables.
#[derive(Debug, Clone, Default)]
pub struct Script {
    text: String,
    validation_map: BTreeMap<usize, String>,
    assert_failure_map: BTreeMap<usize, bool>,
}

impl Script {
    /// Append a line, adding the trailing newline.
    pub fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    /// Append raw text, ensuring it ends with a newline.
    pub fn push_block(&mut self, text: &str) {
        self.text.push_str(text);
        if !text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    /// Append an empty separator line.
    pub fn push_blank(&mut self) {
        self.text.push('\n');
    }

    /// Record that `index`'s captured output must contain `needle`.
    pub fn expect_output(&mut self, index: usize, needle: String) {
        self.validation_map.insert(index, needle);
    }

    /// Record that `index` is expected to exit non-zero.
    pub fn expect_failure(&mut self, index: usize) {
        self.assert_failure_map.insert(index, true);
    }

    /// The rendered shell program.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Block index → expected output substring.
    #[must_use]
    pub const fn validation_map(&self) -> &BTreeMap<usize, String> {
        &self.validation_map
    }

    /// Block index → expected-to-fail flag.
    #[must_use]
    pub const fn assert_failure_map(&self) -> &BTreeMap<usize, bool> {
        &self.assert_failure_map
    }

    /// Whether any block is expected to fail, inverting the run's
    /// exit-status semantics.
    #[must_use]
    pub fn expects_failure(&self) -> bool {
        !self.assert_failure_map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_line_appends_newline() {
        let mut script = Script::default();
        script.push_line("echo hi");
        script.push_line("echo bye");
        assert_eq!(script.text(), "echo hi\necho bye\n");
    }

    #[test]
    fn push_block_normalizes_trailing_newline() {
        let mut script = Script::default();
        script.push_block("echo a\necho b");
        assert_eq!(script.text(), "echo a\necho b\n");
        script.push_block("echo c\n");
        assert_eq!(script.text(), "echo a\necho b\necho c\n");
    }

    #[test]
    fn side_tables_record_expectations() {
        let mut script = Script::default();
        assert!(!script.expects_failure());
        script.expect_output(2, "ready".into());
        script.expect_failure(3);
        assert_eq!(script.validation_map().get(&2).map(String::as_str), Some("ready"));
        assert_eq!(script.assert_failure_map().get(&3), Some(&true));
        assert!(script.expects_failure());
    }
}
