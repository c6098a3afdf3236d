//! Core data types: directive sets, blocks, and their typed values.
//!
//! A [`Directives`] value is the parsed form of a fence line's `docci-*`
//! tokens; a [`Block`] pairs one fenced region's body with its directives
//! and global 1-based index. Typed values (`url|timeout`, `old;new`,
//! `N-M`) parse through constructors on their dedicated types so the tag
//! parser can report the offending token alongside the tag name.

use serde::Serialize;

/// An endpoint-readiness requirement: poll `url` until 2xx or timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSpec {
    /// URL probed by HTTP GET.
    pub url: String,
    /// Seconds to keep polling before giving up.
    pub timeout_secs: u64,
}

impl EndpointSpec {
    /// Parse a `url|timeout_secs` pair. Both halves are required; the
    /// timeout must be a positive integer.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let Some((url, timeout)) = raw.split_once('|') else {
            return Err(format!("expected url|timeout_secs, got '{raw}'"));
        };
        if url.is_empty() {
            return Err(format!("empty url in endpoint spec '{raw}'"));
        }
        let timeout_secs: u64 = timeout
            .parse()
            .map_err(|_| format!("invalid timeout '{timeout}' in endpoint spec '{raw}'"))?;
        if timeout_secs == 0 {
            return Err(format!("timeout must be positive in endpoint spec '{raw}'"));
        }
        Ok(Self {
            url: url.to_string(),
            timeout_secs,
        })
    }
}

/// A literal `old;new` text substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaceSpec {
    /// Substring to replace, matched literally.
    pub old: String,
    /// Replacement text.
    pub new: String,
}

impl ReplaceSpec {
    /// Parse an `old;new` pair, splitting on the first `;`. Both halves
    /// must be non-empty.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let Some((old, new)) = raw.split_once(';') else {
            return Err(format!("expected old;new, got '{raw}'"));
        };
        if old.is_empty() || new.is_empty() {
            return Err(format!("both halves of '{raw}' must be non-empty"));
        }
        Ok(Self {
            old: old.to_string(),
            new: new.to_string(),
        })
    }

    /// Apply the substitution to `body`, replacing all occurrences.
    #[must_use]
    pub fn apply(&self, body: &str) -> String {
        body.replace(&self.old, &self.new)
    }
}

/// A 1-based inclusive line range. A single line `N` is `N-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineRange {
    /// First line, 1-based.
    pub start: usize,
    /// Last line, inclusive.
    pub end: usize,
}

impl LineRange {
    /// Parse `N` or `N-M` where both are positive and N ≤ M.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (start, end) = match raw.split_once('-') {
            Some((a, b)) => (parse_line_number(a, raw)?, parse_line_number(b, raw)?),
            None => {
                let line = parse_line_number(raw, raw)?;
                (line, line)
            },
        };
        if start > end {
            return Err(format!("range '{raw}' runs backwards ({start} > {end})"));
        }
        Ok(Self { start, end })
    }

    /// Whether this range covers a single line.
    #[must_use]
    pub const fn is_single(self) -> bool {
        self.start == self.end
    }
}

fn parse_line_number(token: &str, raw: &str) -> Result<usize, String> {
    let value: usize = token
        .parse()
        .map_err(|_| format!("invalid line number '{token}' in '{raw}'"))?;
    if value == 0 {
        return Err(format!("line numbers are 1-based, got 0 in '{raw}'"));
    }
    Ok(value)
}

/// The typed directive set parsed from one fence-opener line.
///
/// Defaults are "absent": flags false, options `None`, delays `0.0`,
/// `retry_count` 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Directives {
    /// Skip this block entirely.
    pub ignore: bool,
    /// Captured output for this block must contain this substring.
    pub output_contains: Option<String>,
    /// Launch the block asynchronously.
    pub background: bool,
    /// Terminate the background block with this global index.
    pub background_kill: Option<usize>,
    /// The block is expected to exit non-zero.
    pub assert_failure: bool,
    /// Only run on the named host OS.
    pub os: Option<String>,
    /// Poll this endpoint before running.
    pub wait_for_endpoint: Option<EndpointSpec>,
    /// Retry the block up to N extra times on failure.
    pub retry_count: u32,
    /// Sleep before the block.
    pub delay_before_secs: f64,
    /// Sleep after the block.
    pub delay_after_secs: f64,
    /// Sleep between each shell command of the block.
    pub delay_per_cmd_secs: f64,
    /// Skip the block when this file exists.
    pub if_file_not_exists: Option<String>,
    /// Skip the block when this command is on PATH.
    pub if_not_installed: Option<String>,
    /// Literal substitution applied to the body before emission.
    pub replace_text: Option<ReplaceSpec>,
    /// Treat the body as content of this file.
    pub file: Option<String>,
    /// Overwrite `file` with the body.
    pub reset_file: bool,
    /// Insert the body before this line of `file`.
    pub line_insert: Option<usize>,
    /// Replace this line range of `file` with the body.
    pub line_replace: Option<LineRange>,
}

impl Directives {
    /// Check the cross-field mutual-exclusion rules.
    ///
    /// Violations are hard parse errors; the returned message names both
    /// offending tags.
    pub fn validate(&self) -> Result<(), String> {
        const EXCLUSIONS: &[(&str, &str)] = &[
            ("docci-output-contains", "docci-background"),
            ("docci-assert-failure", "docci-background"),
            ("docci-assert-failure", "docci-output-contains"),
            ("docci-wait-for-endpoint", "docci-background"),
            ("docci-retry", "docci-background"),
            ("docci-file", "docci-background"),
            ("docci-line-insert", "docci-line-replace"),
        ];
        for (a, b) in EXCLUSIONS {
            if self.carries(a) && self.carries(b) {
                return Err(format!("Cannot use both {a} and {b}"));
            }
        }
        if self.file.is_none() {
            for tag in ["docci-reset-file", "docci-line-insert", "docci-line-replace"] {
                if self.carries(tag) {
                    return Err(format!("{tag} requires docci-file"));
                }
            }
        }
        Ok(())
    }

    fn carries(&self, tag: &str) -> bool {
        match tag {
            "docci-output-contains" => self.output_contains.is_some(),
            "docci-background" => self.background,
            "docci-assert-failure" => self.assert_failure,
            "docci-wait-for-endpoint" => self.wait_for_endpoint.is_some(),
            "docci-retry" => self.retry_count > 0,
            "docci-file" => self.file.is_some(),
            "docci-reset-file" => self.reset_file,
            "docci-line-insert" => self.line_insert.is_some(),
            "docci-line-replace" => self.line_replace.is_some(),
            _ => false,
        }
    }
}

/// Whether a fence language tag names a shell this tool executes.
///
/// Fences in other languages are recognized only when they carry
/// file-operation directives treating the body as file content.
#[must_use]
pub fn is_shell_language(language: &str) -> bool {
    matches!(
        language.to_ascii_lowercase().as_str(),
        "bash" | "sh" | "shell" | "zsh"
    )
}

/// One fenced code region with its directives and global index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Global 1-based index, assigned consecutively across all retained
    /// blocks of all input documents.
    pub index: usize,
    /// Language tag from the fence opener (may be empty).
    pub language: String,
    /// Accumulated body, each line with its trailing newline.
    pub body: String,
    /// Parsed directive set.
    pub directives: Directives,
    /// 1-based source line of the fence opener.
    pub line_number: usize,
    /// Source document name, when scanning named input.
    pub source_file: Option<String>,
}

impl Block {
    /// Whether this block launches asynchronously.
    #[must_use]
    pub const fn is_background(&self) -> bool {
        self.directives.background
    }

    /// Whether this block is a file operation rather than shell code.
    #[must_use]
    pub const fn is_file_operation(&self) -> bool {
        self.directives.file.is_some()
    }
}

/// Normalize an OS name or alias to one of `linux`, `macos`, `windows`.
///
/// Returns `None` for unknown values; the parser treats those as
/// "skip this block" so documents may carry blocks for hosts this build
/// does not know about.
#[must_use]
pub fn normalize_os(value: &str) -> Option<&'static str> {
    match value.to_ascii_lowercase().as_str() {
        "linux" => Some("linux"),
        "macos" | "mac" | "osx" | "darwin" => Some("macos"),
        "windows" | "win" => Some("windows"),
        _ => None,
    }
}

/// The current host OS, normalized like [`normalize_os`].
#[must_use]
pub fn host_os() -> &'static str {
    normalize_os(std::env::consts::OS).unwrap_or(std::env::consts::OS)
}
