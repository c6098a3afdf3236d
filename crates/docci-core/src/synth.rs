//! Script synthesis: rendering parsed blocks into one shell program.
//!
//! The synthesizer is deterministic and total: any block sequence that
//! passed parsing renders to a valid bash program. All fragments are fixed
//! templates with named placeholders; nothing here branches on anything
//! but directive values and the run options.
//!
//! The emitted program leans on bash specifics on purpose: `set -eT`, the
//! DEBUG trap on `$BASH_COMMAND`, process-group TERM with a plain-PID
//! fallback, and `jobs -p | xargs -r kill` for reaping. These are
//! requirements of the script, not artifacts of the host language.

use crate::logging::LogSink;
use crate::markers;
use crate::script::Script;
use crate::types::Block;

/// Inter-attempt sleep for retry wrappers when `DOCCI_RETRY_DELAY` is
/// unset.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

/// Run-level options that shape the synthesized program.
#[derive(Debug, Clone)]
pub struct SynthOptions {
    /// Keep the shell alive after all blocks, reaping on INT/TERM instead
    /// of installing the EXIT cleanup trap.
    pub keep_running: bool,
    /// Suppress the background-log replay section, emitting only the
    /// scratch-file removals.
    pub hide_background_logs: bool,
    /// Seconds to sleep between retry attempts.
    pub retry_delay_secs: u64,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            keep_running: false,
            hide_background_logs: false,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

/// Renders block sequences into [`Script`] values.
#[derive(Debug)]
pub struct Synthesizer {
    opts: SynthOptions,
    log: LogSink,
}

impl Synthesizer {
    /// Create a synthesizer with the given options and log sink.
    #[must_use]
    pub const fn new(opts: SynthOptions, log: LogSink) -> Self {
        Self { opts, log }
    }

    /// Render `blocks` into a single shell program.
    #[must_use]
    pub fn synthesize(&self, blocks: &[Block]) -> Script {
        let mut script = Script::default();
        self.emit_prologue(&mut script);
        for block in blocks {
            self.emit_block(&mut script, block);
            script.push_blank();
        }
        self.emit_epilogue(&mut script, blocks);
        script
    }

    /// Global framing: the EXIT cleanup trap, unless the run keeps the
    /// shell alive (then the interrupt-trap variant goes at the end).
    fn emit_prologue(&self, script: &mut Script) {
        if self.opts.keep_running {
            return;
        }
        script.push_block(
            "docci_cleanup() {\n\
             \x20   echo \"Cleaning up background processes...\"\n\
             \x20   jobs -p | xargs -r kill 2>/dev/null || true\n\
             \x20   wait 2>/dev/null || true\n\
             }\n\
             trap docci_cleanup EXIT\n",
        );
        script.push_blank();
    }

    fn emit_block(&self, script: &mut Script, block: &Block) {
        if self.log.debug_enabled() {
            let source = block.source_file.as_deref().unwrap_or("unknown");
            script.push_line(&format!(
                "echo \"{}\"",
                markers::debug_header(block.index, &block.language, source)
            ));
        }
        if let Some(target) = block.directives.background_kill {
            emit_background_kill(script, block.index, target);
        } else if block.is_background() {
            emit_background(script, block);
        } else {
            self.emit_foreground(script, block);
        }
    }

    /// A foreground block: markers, delays, readiness polling, guards,
    /// then either a file operation or the (possibly retried) shell body.
    fn emit_foreground(&self, script: &mut Script, block: &Block) {
        let directives = &block.directives;

        script.push_line(&format!("echo '{}'", markers::block_start(block.index)));
        if directives.delay_before_secs > 0.0 {
            script.push_line(&format!("sleep {}", fmt_secs(directives.delay_before_secs)));
        }
        if let Some(endpoint) = &directives.wait_for_endpoint {
            emit_endpoint_wait(script, block.index, &endpoint.url, endpoint.timeout_secs);
        }

        let guard_path = directives.if_file_not_exists.as_deref();
        if let Some(path) = guard_path {
            script.push_line(&format!(
                "if [ -f \"{path}\" ]; then echo \"File {path} exists, skipping block {index}\"; \
                 else echo \"File {path} is missing, executing block {index}\"; fi",
                index = block.index
            ));
            script.push_line(&format!("if [ ! -f \"{path}\" ]; then"));
        }

        let body = directives
            .replace_text
            .as_ref()
            .map_or_else(|| block.body.clone(), |replace| replace.apply(&block.body));

        if block.is_file_operation() {
            emit_file_operation(script, block, &body);
        } else if directives.retry_count > 0 {
            self.emit_retry(script, block, &body);
        } else {
            emit_shell_body(script, block, &body);
        }

        if directives.delay_after_secs > 0.0 {
            script.push_line(&format!("sleep {}", fmt_secs(directives.delay_after_secs)));
        }
        if guard_path.is_some() {
            script.push_line("fi");
        }
        script.push_line(&format!("echo '{}'", markers::block_end(block.index)));

        if let Some(needle) = &directives.output_contains {
            script.expect_output(block.index, needle.clone());
        }
        if directives.assert_failure {
            script.expect_failure(block.index);
        }
    }

    /// Retry wrapper: run the body in a subshell until it succeeds or all
    /// attempts are spent, then re-exit with the last status.
    fn emit_retry(&self, script: &mut Script, block: &Block, body: &str) {
        let index = block.index;
        let max_retries = block.directives.retry_count;
        let delay = self.opts.retry_delay_secs;

        script.push_line(&format!("DOCCI_RETRY_COUNT_{index}=0"));
        script.push_line("until (");
        push_prelude(script, block);
        script.push_block(body);
        script.push_line("trap - DEBUG");
        script.push_line("); do");
        script.push_line(&format!("    DOCCI_LAST_EXIT_{index}=$?"));
        script.push_line(&format!(
            "    DOCCI_RETRY_COUNT_{index}=$((DOCCI_RETRY_COUNT_{index} + 1))"
        ));
        script.push_line(&format!(
            "    if [ \"$DOCCI_RETRY_COUNT_{index}\" -gt {max_retries} ]; then"
        ));
        script.push_line(&format!(
            "        echo \"Block {index} still failing after {attempts} attempts\" >&2",
            attempts = u64::from(max_retries) + 1
        ));
        script.push_line(&format!("        exit \"$DOCCI_LAST_EXIT_{index}\""));
        script.push_line("    fi");
        script.push_line(&format!(
            "    echo \"Block {index} failed (attempt $DOCCI_RETRY_COUNT_{index}), retrying in {delay}s\" >&2"
        ));
        script.push_line(&format!("    sleep {delay}"));
        script.push_line("done");
    }

    /// Trailing sections: background-log replay (or bare removal) and the
    /// keep-running interrupt trap with its final infinite sleep.
    fn emit_epilogue(&self, script: &mut Script, blocks: &[Block]) {
        let background: Vec<usize> = blocks
            .iter()
            .filter(|block| block.is_background())
            .map(|block| block.index)
            .collect();

        for index in background {
            let log_path = markers::background_log_path(index);
            if self.opts.hide_background_logs {
                script.push_line(&format!("rm -f \"{log_path}\""));
                continue;
            }
            script.push_line(&format!("if [ -f \"{log_path}\" ]; then"));
            script.push_line("    echo \"\"");
            script.push_line(&format!(
                "    echo \"=== Background logs for block {index} ===\""
            ));
            script.push_line(&format!("    cat \"{log_path}\""));
            script.push_line(&format!("    rm -f \"{log_path}\""));
            script.push_line("fi");
        }

        if self.opts.keep_running {
            script.push_blank();
            script.push_block(
                "docci_interrupt_cleanup() {\n\
                 \x20   echo \"Cleaning up background processes...\"\n\
                 \x20   jobs -p | xargs -r kill 2>/dev/null || true\n\
                 \x20   exit 0\n\
                 }\n\
                 trap docci_interrupt_cleanup INT TERM\n",
            );
            script.push_line("echo \"All blocks finished; keeping session alive (Ctrl+C to stop)\"");
            script.push_line("while true; do sleep 86400; done");
        }
    }
}

/// Strict flags and the per-command DEBUG trap opening a shell body.
///
/// `set -T` alone for assert-failure blocks, so `set -e` does not prevent
/// the expected failure.
fn push_prelude(script: &mut Script, block: &Block) {
    if block.directives.assert_failure {
        script.push_line("set -T");
    } else {
        script.push_line("set -eT");
    }
    script.push_line(&format!(
        "trap 'echo \"Executing CMD: $BASH_COMMAND\" >&2; sleep {}' DEBUG",
        fmt_secs(block.directives.delay_per_cmd_secs)
    ));
}

/// The plain shell-body fragment: prelude, body, trap teardown.
fn emit_shell_body(script: &mut Script, block: &Block, body: &str) {
    push_prelude(script, block);
    script.push_block(body);
    script.push_line("trap - DEBUG");
}

/// Background launch: parenthesized subshell redirected to the scratch
/// file, PID recorded into the per-index variable.
fn emit_background(script: &mut Script, block: &Block) {
    let index = block.index;
    let log_path = markers::background_log_path(index);
    let pid_var = markers::background_pid_var(index);
    let body = block
        .directives
        .replace_text
        .as_ref()
        .map_or_else(|| block.body.clone(), |replace| replace.apply(&block.body));

    script.push_line(&format!(
        "echo \"Starting background block {index} (output: {log_path})\""
    ));
    script.push_line("(");
    script.push_block(&body);
    script.push_line(&format!(") >\"{log_path}\" 2>&1 &"));
    script.push_line(&format!("{pid_var}=$!"));
}

/// Terminate a previously started background block: TERM to the process
/// group, plain-PID fallback, reap ignoring status, unset the variable.
fn emit_background_kill(script: &mut Script, index: usize, target: usize) {
    let pid_var = markers::background_pid_var(target);
    script.push_line(&format!("if [ -n \"${{{pid_var}:-}}\" ]; then"));
    script.push_line(&format!(
        "    echo \"Stopping background block {target} (pid ${pid_var})\""
    ));
    script.push_line(&format!(
        "    kill -TERM -- -\"${pid_var}\" 2>/dev/null || kill -TERM \"${pid_var}\" 2>/dev/null || true"
    ));
    script.push_line(&format!("    wait \"${pid_var}\" 2>/dev/null || true"));
    script.push_line(&format!("    unset {pid_var}"));
    script.push_line("else");
    script.push_line(&format!(
        "    echo \"Warning: block {index} found no background process for block {target}\""
    ));
    script.push_line("fi");
}

/// Endpoint-readiness polling: record start time, loop on elapsed
/// seconds, probe with curl or wget, break on 2xx, exit 1 on timeout.
fn emit_endpoint_wait(script: &mut Script, index: usize, url: &str, timeout_secs: u64) {
    script.push_line(&format!(
        "echo \"Waiting for {url} to become ready (timeout: {timeout_secs}s)\""
    ));
    script.push_line(&format!("DOCCI_WAIT_START_{index}=$(date +%s)"));
    script.push_line("while true; do");
    script.push_line(&format!(
        "    if [ $(( $(date +%s) - DOCCI_WAIT_START_{index} )) -ge {timeout_secs} ]; then"
    ));
    script.push_line(&format!(
        "        echo \"Timed out waiting for {url} after {timeout_secs}s\" >&2"
    ));
    script.push_line("        exit 1");
    script.push_line("    fi");
    script.push_line("    if command -v curl >/dev/null 2>&1; then");
    script.push_line(&format!(
        "        DOCCI_PROBE_{index}=$(curl -s -o /dev/null -w '%{{http_code}}' \"{url}\" 2>/dev/null || true)"
    ));
    script.push_line(&format!(
        "        case \"$DOCCI_PROBE_{index}\" in 2*) break ;; esac"
    ));
    script.push_line("    elif command -v wget >/dev/null 2>&1; then");
    script.push_line(&format!(
        "        if wget -q -O /dev/null \"{url}\" 2>/dev/null; then break; fi"
    ));
    script.push_line("    else");
    script.push_line(&format!(
        "        echo \"Neither curl nor wget is available to probe {url}\" >&2"
    ));
    script.push_line("        exit 1");
    script.push_line("    fi");
    script.push_line("    sleep 1");
    script.push_line("done");
}

/// File-operation fragments: heredoc create/overwrite, line insertion,
/// or line-range replacement. Skips the shell-body template entirely.
fn emit_file_operation(script: &mut Script, block: &Block, body: &str) {
    let directives = &block.directives;
    let Some(file) = directives.file.as_deref() else {
        return;
    };

    if let Some(target_line) = directives.line_insert {
        emit_line_insert(script, block.index, file, body, target_line);
    } else if let Some(range) = directives.line_replace {
        emit_line_replace(script, block.index, file, body, range.start, range.end);
    } else {
        // Reset/create: the body becomes the whole file.
        script.push_line(&format!("cat > \"{file}\" << 'DOCCI_EOF'"));
        script.push_block(body);
        script.push_line("DOCCI_EOF");
    }
}

/// Read the file line by line into a temp copy, injecting the body before
/// the target line; append when the target is past EOF.
fn emit_line_insert(script: &mut Script, index: usize, file: &str, body: &str, target: usize) {
    emit_file_edit_guard(script, file);
    script.push_line(&format!("DOCCI_TMP_{index}=$(mktemp)"));
    script.push_line(&format!("DOCCI_LINENO_{index}=0"));
    script.push_line(&format!("DOCCI_INSERTED_{index}=0"));
    script.push_line(&format!(
        "while IFS= read -r DOCCI_LINE_{index} || [ -n \"$DOCCI_LINE_{index}\" ]; do"
    ));
    script.push_line(&format!(
        "    DOCCI_LINENO_{index}=$((DOCCI_LINENO_{index} + 1))"
    ));
    script.push_line(&format!("    if [ \"$DOCCI_LINENO_{index}\" -eq {target} ]; then"));
    script.push_line(&format!("        cat >> \"$DOCCI_TMP_{index}\" << 'DOCCI_EOF'"));
    script.push_block(body);
    script.push_line("DOCCI_EOF");
    script.push_line(&format!("        DOCCI_INSERTED_{index}=1"));
    script.push_line("    fi");
    script.push_line(&format!(
        "    printf '%s\\n' \"$DOCCI_LINE_{index}\" >> \"$DOCCI_TMP_{index}\""
    ));
    script.push_line(&format!("done < \"{file}\""));
    script.push_line(&format!("if [ \"$DOCCI_INSERTED_{index}\" -eq 0 ]; then"));
    script.push_line(&format!("    cat >> \"$DOCCI_TMP_{index}\" << 'DOCCI_EOF'"));
    script.push_block(body);
    script.push_line("DOCCI_EOF");
    script.push_line("fi");
    script.push_line(&format!("mv \"$DOCCI_TMP_{index}\" \"{file}\""));
}

/// Read the file line by line, dropping lines in the inclusive range and
/// writing the body once at the range start. A range past EOF replaces
/// only the existing suffix.
fn emit_line_replace(
    script: &mut Script,
    index: usize,
    file: &str,
    body: &str,
    start: usize,
    end: usize,
) {
    emit_file_edit_guard(script, file);
    script.push_line(&format!("DOCCI_TMP_{index}=$(mktemp)"));
    script.push_line(&format!("DOCCI_LINENO_{index}=0"));
    script.push_line(&format!(
        "while IFS= read -r DOCCI_LINE_{index} || [ -n \"$DOCCI_LINE_{index}\" ]; do"
    ));
    script.push_line(&format!(
        "    DOCCI_LINENO_{index}=$((DOCCI_LINENO_{index} + 1))"
    ));
    script.push_line(&format!("    if [ \"$DOCCI_LINENO_{index}\" -eq {start} ]; then"));
    script.push_line(&format!("        cat >> \"$DOCCI_TMP_{index}\" << 'DOCCI_EOF'"));
    script.push_block(body);
    script.push_line("DOCCI_EOF");
    script.push_line("    fi");
    script.push_line(&format!(
        "    if [ \"$DOCCI_LINENO_{index}\" -lt {start} ] || [ \"$DOCCI_LINENO_{index}\" -gt {end} ]; then"
    ));
    script.push_line(&format!(
        "        printf '%s\\n' \"$DOCCI_LINE_{index}\" >> \"$DOCCI_TMP_{index}\""
    ));
    script.push_line("    fi");
    script.push_line(&format!("done < \"{file}\""));
    script.push_line(&format!("mv \"$DOCCI_TMP_{index}\" \"{file}\""));
}

/// Line edits on a missing file exit non-zero with a diagnostic.
fn emit_file_edit_guard(script: &mut Script, file: &str) {
    script.push_line(&format!("if [ ! -f \"{file}\" ]; then"));
    script.push_line(&format!("    echo \"Cannot edit missing file: {file}\" >&2"));
    script.push_line("    exit 1");
    script.push_line("fi");
}

/// Render seconds for `sleep`: integral values without the decimal point.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fmt_secs(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{value}")
    }
}
