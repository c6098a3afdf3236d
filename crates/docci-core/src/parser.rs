//! Markdown scanning and fence-line tag parsing.
//!
//! The scanner walks a document line by line. A line whose leading
//! non-space prefix is <code>```</code> opens a fenced block; the matching
//! closer is a line equal to <code>```</code> after stripping trailing
//! spaces. Between the two, lines are appended verbatim to the block body.
//! Nested fences are not supported.
//!
//! The fence-opener line carries the language token followed by `docci-*`
//! directive tokens. Directive values may be bare, double-quoted, or
//! single-quoted; quoted values may contain whitespace. Unknown `docci-*`
//! names are hard errors; other fence attributes are ignored.
//!
//! Blocks that are `docci-ignore`d, or whose host-OS / command-installed
//! guards are unsatisfied, are discarded at scan time and never consume a
//! global index. The scanner owns the index counter, so scanning several
//! documents through one scanner yields one consecutive index space.

use std::path::Path;

use crate::error::{Error, Result};
use crate::logging::LogSink;
use crate::tags::{self, TagValueKind};
use crate::types::{
    host_os, is_shell_language, normalize_os, Block, Directives, EndpointSpec, LineRange,
    ReplaceSpec,
};

/// Scans Markdown documents into ordered [`Block`] sequences.
///
/// The scanner is stateful: it holds the global index counter across
/// documents. Create one scanner per run and feed it every input document
/// in order.
#[derive(Debug)]
pub struct DocumentScanner {
    next_index: usize,
    log: LogSink,
}

/// A block being accumulated between its opening and closing fence.
#[derive(Debug)]
struct PendingBlock {
    language: String,
    directives: Directives,
    body: String,
    line_number: usize,
}

impl DocumentScanner {
    /// Create a scanner starting at global index 1.
    #[must_use]
    pub const fn new(log: LogSink) -> Self {
        Self { next_index: 1, log }
    }

    /// Scan a document from disk, labelling blocks with its path.
    pub fn scan_file(&mut self, path: &Path) -> Result<Vec<Block>> {
        let label = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("input file '{label}' does not exist"))
            } else {
                Error::Io(err)
            }
        })?;
        self.scan(&text, Some(&label))
    }

    /// Scan document text into blocks, in document order.
    ///
    /// # Errors
    ///
    /// Returns a parse error for unknown tags, malformed typed values,
    /// illegal tag combinations, or an unterminated fence. The error
    /// carries `source_file` (or `<input>`) and the fence line number.
    pub fn scan(&mut self, text: &str, source_file: Option<&str>) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut pending: Option<PendingBlock> = None;

        for (offset, line) in text.lines().enumerate() {
            let line_number = offset + 1;
            match pending.take() {
                Some(mut block) => {
                    if line.trim_end() == "```" {
                        if let Some(finalized) = self.finalize(block, source_file) {
                            blocks.push(finalized);
                        }
                    } else {
                        block.body.push_str(line);
                        block.body.push('\n');
                        pending = Some(block);
                    }
                },
                None => {
                    let trimmed = line.trim_start();
                    if let Some(meta) = trimmed.strip_prefix("```") {
                        pending = Some(open_fence(meta, line_number, source_file)?);
                    }
                },
            }
        }

        if let Some(block) = pending {
            return Err(Error::parse(
                source_file,
                block.line_number,
                "code fence is never closed",
            ));
        }

        Ok(blocks)
    }

    /// Apply parse-time guards and assign the global index.
    fn finalize(&mut self, pending: PendingBlock, source_file: Option<&str>) -> Option<Block> {
        let directives = &pending.directives;
        if directives.ignore {
            self.log.debug(&format!(
                "skipping ignored block at line {}",
                pending.line_number
            ));
            return None;
        }
        // Non-shell fences are file content at most, never shell to run.
        if directives.file.is_none() && !is_shell_language(&pending.language) {
            self.log.debug(&format!(
                "skipping non-shell '{}' block at line {}",
                pending.language, pending.line_number
            ));
            return None;
        }
        if let Some(os) = &directives.os {
            if normalize_os(os) != Some(host_os()) {
                self.log.debug(&format!(
                    "skipping block at line {} (requires OS '{os}', host is '{}')",
                    pending.line_number,
                    host_os()
                ));
                return None;
            }
        }
        if let Some(command) = &directives.if_not_installed {
            if is_command_installed(command) {
                self.log.debug(&format!(
                    "skipping block at line {} ('{command}' is already installed)",
                    pending.line_number
                ));
                return None;
            }
        }

        let index = self.next_index;
        self.next_index += 1;
        Some(Block {
            index,
            language: pending.language,
            body: pending.body,
            directives: pending.directives,
            line_number: pending.line_number,
            source_file: source_file.map(str::to_string),
        })
    }
}

/// Parse a fence opener's meta string into a pending block.
fn open_fence(meta: &str, line_number: usize, source_file: Option<&str>) -> Result<PendingBlock> {
    let tokens = split_fence_tokens(meta)
        .map_err(|message| Error::parse(source_file, line_number, message))?;

    let mut language = String::new();
    let mut directives = Directives::default();

    for (position, token) in tokens.iter().enumerate() {
        if position == 0 && !tags::is_tag_token(token) {
            language = token.clone();
            continue;
        }
        if !tags::is_tag_token(token) {
            // Foreign fence attributes (titles, highlight hints) are not ours.
            continue;
        }
        apply_tag(&mut directives, token)
            .map_err(|message| Error::parse(source_file, line_number, message))?;
    }

    directives
        .validate()
        .map_err(|message| Error::parse(source_file, line_number, message))?;

    Ok(PendingBlock {
        language,
        directives,
        body: String::new(),
        line_number,
    })
}

/// Split a fence meta string into whitespace-separated tokens, keeping
/// quoted spans (which may contain whitespace) intact.
fn split_fence_tokens(meta: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in meta.chars() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == q {
                    quote = None;
                }
            },
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                current.push(ch);
            },
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            },
            None => current.push(ch),
        }
    }
    if quote.is_some() {
        return Err(format!("unterminated quote in fence attributes '{meta}'"));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Apply one `docci-*` token to the directive set.
fn apply_tag(directives: &mut Directives, token: &str) -> std::result::Result<(), String> {
    let (raw_name, raw_value) = match token.find('=') {
        Some(pos) => (&token[..pos], Some(&token[pos + 1..])),
        None => (token, None),
    };

    let Some(spec) = tags::lookup(raw_name) else {
        return Err(format!("unknown tag '{raw_name}'"));
    };

    if spec.kind == TagValueKind::Flag {
        if raw_value.is_some() {
            return Err(format!("tag '{}' does not take a value", spec.name));
        }
    } else if raw_value.is_none_or(str::is_empty) {
        return Err(format!(
            "tag '{}' requires a value ({})",
            spec.name,
            spec.kind.describe()
        ));
    }

    let value = raw_value.map(strip_quotes).unwrap_or_default();

    match spec.name {
        "docci-ignore" => directives.ignore = true,
        "docci-background" => directives.background = true,
        "docci-assert-failure" => directives.assert_failure = true,
        "docci-reset-file" => directives.reset_file = true,
        "docci-output-contains" => directives.output_contains = Some(value),
        "docci-os" => directives.os = Some(value),
        "docci-if-file-not-exists" => directives.if_file_not_exists = Some(value),
        "docci-if-not-installed" => directives.if_not_installed = Some(value),
        "docci-file" => directives.file = Some(value),
        "docci-background-kill" => {
            directives.background_kill = Some(parse_positive_int(&value, spec.name)?);
        },
        "docci-retry" => {
            let count = parse_positive_int(&value, spec.name)?;
            directives.retry_count =
                u32::try_from(count).map_err(|_| format!("'{value}' is too large for {}", spec.name))?;
        },
        "docci-line-insert" => {
            directives.line_insert = Some(parse_positive_int(&value, spec.name)?);
        },
        "docci-delay-before" => {
            directives.delay_before_secs = parse_positive_float(&value, spec.name)?;
        },
        "docci-delay-after" => {
            directives.delay_after_secs = parse_positive_float(&value, spec.name)?;
        },
        "docci-delay-per-cmd" => {
            directives.delay_per_cmd_secs = parse_positive_float(&value, spec.name)?;
        },
        "docci-wait-for-endpoint" => {
            directives.wait_for_endpoint = Some(
                EndpointSpec::parse(&value)
                    .map_err(|message| format!("{message} for {}", spec.name))?,
            );
        },
        "docci-replace-text" => {
            directives.replace_text = Some(
                ReplaceSpec::parse(&value)
                    .map_err(|message| format!("{message} for {}", spec.name))?,
            );
        },
        "docci-line-replace" => {
            directives.line_replace = Some(
                LineRange::parse(&value)
                    .map_err(|message| format!("{message} for {}", spec.name))?,
            );
        },
        other => return Err(format!("unknown tag '{other}'")),
    }
    Ok(())
}

fn parse_positive_int(value: &str, tag: &str) -> std::result::Result<usize, String> {
    let parsed: usize = value
        .parse()
        .map_err(|_| format!("invalid integer '{value}' for {tag}"))?;
    if parsed == 0 {
        return Err(format!("value for {tag} must be positive, got '{value}'"));
    }
    Ok(parsed)
}

fn parse_positive_float(value: &str, tag: &str) -> std::result::Result<f64, String> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| format!("invalid number '{value}' for {tag}"))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(format!("value for {tag} must be positive, got '{value}'"));
    }
    Ok(parsed)
}

/// Strip one layer of matching single or double quotes.
fn strip_quotes(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

/// Validate cross-block references once every document has been scanned.
///
/// Every `docci-background-kill` must name a retained block that carries
/// `docci-background`; the error enumerates the available background
/// indexes in ascending order.
pub fn validate_blocks(blocks: &[Block]) -> Result<()> {
    let background_indexes: Vec<usize> = blocks
        .iter()
        .filter(|block| block.is_background())
        .map(|block| block.index)
        .collect();

    for block in blocks {
        if let Some(target) = block.directives.background_kill {
            if !background_indexes.contains(&target) {
                return Err(Error::parse(
                    block.source_file.as_deref(),
                    block.line_number,
                    format!(
                        "block {} (docci-background-kill={target}) references a non-existent \
                         background process. Available background process indexes: {background_indexes:?}",
                        block.index
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Whether `name` resolves to an executable on `PATH`.
///
/// Names containing a path separator are checked directly.
#[must_use]
pub fn is_command_installed(name: &str) -> bool {
    if name.contains('/') {
        return is_executable(Path::new(name));
    }
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| is_executable(&dir.join(name)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
