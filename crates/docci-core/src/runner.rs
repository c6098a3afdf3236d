//! Run orchestration: documents in, one aggregated result out.
//!
//! A run parses every input document through one scanner (so block
//! indices stay globally unique), validates cross-block references,
//! synthesizes a single script covering all documents (which is how
//! exported variables and cwd persist across documents), executes it
//! once, and reconciles the outcome against the script's side tables.

use std::path::PathBuf;

use crate::demux::{self, ASSERT_FAILURE_SUCCEEDED};
use crate::error::{Error, Result};
use crate::executor::{ExecOptions, ExecutionOutcome, Executor};
use crate::logging::LogSink;
use crate::parser::{self, DocumentScanner};
use crate::script::Script;
use crate::synth::{SynthOptions, Synthesizer, DEFAULT_RETRY_DELAY_SECS};
use crate::types::Block;

/// Environment variable overriding the retry wrappers' inter-attempt
/// sleep (non-negative integer seconds).
pub const RETRY_DELAY_ENV_VAR: &str = "DOCCI_RETRY_DELAY";

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Keep the shell alive after all blocks complete.
    pub keep_running: bool,
    /// Suppress the trailing background-log replay.
    pub hide_background_logs: bool,
    /// Directory the shell starts in.
    pub working_dir: Option<PathBuf>,
}

/// The aggregated result of one run.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    /// Exit code of the run: the script's code for unexpected failures,
    /// zero for reconciled expected failures, or a synthesized non-zero
    /// when only validations failed.
    pub exit_code: u32,
    /// Execution-level error, when the script failed unexpectedly.
    pub error: Option<String>,
    /// Full captured stdout, including filtered internal lines.
    pub stdout: String,
    /// Full captured stderr.
    pub stderr: String,
    /// One entry per failed output expectation.
    pub validation_errors: Vec<String>,
}

impl RunResult {
    /// Whether the run succeeded outright.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0 && self.error.is_none() && self.validation_errors.is_empty()
    }
}

/// Read the retry delay from the environment, defaulting to
/// [`DEFAULT_RETRY_DELAY_SECS`]. Read once per run.
pub fn retry_delay_from_env() -> Result<u64> {
    match std::env::var(RETRY_DELAY_ENV_VAR) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            Error::Config(format!(
                "{RETRY_DELAY_ENV_VAR} must be a non-negative integer number of seconds, got '{raw}'"
            ))
        }),
        Err(_) => Ok(DEFAULT_RETRY_DELAY_SECS),
    }
}

/// Drives the parse → synthesize → execute → validate pipeline.
#[derive(Debug)]
pub struct Runner {
    opts: RunOptions,
    log: LogSink,
}

impl Runner {
    /// Create a runner with the given options and log sink.
    #[must_use]
    pub const fn new(opts: RunOptions, log: LogSink) -> Self {
        Self { opts, log }
    }

    /// Parse every document into one globally indexed block sequence.
    ///
    /// Documents are scanned in the order supplied; cross-block
    /// references are validated after all documents are in.
    pub fn parse_documents(&self, paths: &[PathBuf]) -> Result<Vec<Block>> {
        let mut scanner = DocumentScanner::new(self.log.clone());
        let mut blocks = Vec::new();
        for path in paths {
            let parsed = scanner.scan_file(path)?;
            self.log.info(&format!(
                "parsed {} runnable block(s) from {}",
                parsed.len(),
                path.display()
            ));
            blocks.extend(parsed);
        }
        parser::validate_blocks(&blocks)?;
        Ok(blocks)
    }

    /// Run all documents to completion and aggregate the result.
    ///
    /// # Errors
    ///
    /// Returns an error for parse failures, missing inputs, malformed
    /// environment settings, or executor-level hard failures. Script and
    /// validation failures are reported on the returned [`RunResult`].
    pub async fn run(&self, paths: &[PathBuf]) -> Result<RunResult> {
        let blocks = self.parse_documents(paths)?;
        let retry_delay_secs = retry_delay_from_env()?;

        let synth_opts = SynthOptions {
            keep_running: self.opts.keep_running,
            hide_background_logs: self.opts.hide_background_logs,
            retry_delay_secs,
        };
        let script = Synthesizer::new(synth_opts, self.log.clone()).synthesize(&blocks);

        let exec_opts = ExecOptions {
            working_dir: self.opts.working_dir.clone(),
        };
        let outcome = Executor::new(exec_opts, self.log.clone())
            .execute(script.text())
            .await?;

        Ok(reconcile(&script, outcome))
    }
}

/// Map a raw execution outcome onto run semantics.
///
/// With assert-failure blocks present the exit-status meaning inverts: a
/// zero exit is the error, a non-zero exit is expected and validations
/// still run. Without them, any non-zero exit halts before validation.
fn reconcile(script: &Script, outcome: ExecutionOutcome) -> RunResult {
    let ExecutionOutcome {
        exit_code,
        error,
        stdout,
        stderr,
    } = outcome;

    if script.expects_failure() {
        if exit_code == 0 {
            return RunResult {
                exit_code: 1,
                error: Some(ASSERT_FAILURE_SUCCEEDED.to_string()),
                stdout,
                stderr,
                validation_errors: Vec::new(),
            };
        }
        let outputs = demux::demux_block_outputs(&stdout);
        let validation_errors = demux::validate_outputs(&outputs, script.validation_map());
        let exit_code = if validation_errors.is_empty() { 0 } else { exit_code };
        return RunResult {
            exit_code,
            error: None,
            stdout,
            stderr,
            validation_errors,
        };
    }

    if exit_code != 0 {
        return RunResult {
            exit_code,
            error,
            stdout,
            stderr,
            validation_errors: Vec::new(),
        };
    }

    let outputs = demux::demux_block_outputs(&stdout);
    let validation_errors = demux::validate_outputs(&outputs, script.validation_map());
    let exit_code = u32::from(!validation_errors.is_empty());
    RunResult {
        exit_code,
        error: None,
        stdout,
        stderr,
        validation_errors,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn outcome(exit_code: u32, stdout: &str) -> ExecutionOutcome {
        ExecutionOutcome {
            exit_code,
            error: (exit_code != 0).then(|| format!("script exited with status {exit_code}")),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn write_doc(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reconcile_plain_success() {
        let script = Script::default();
        let result = reconcile(&script, outcome(0, ""));
        assert!(result.success());
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn reconcile_unexpected_failure_skips_validation() {
        let mut script = Script::default();
        script.expect_output(1, "never checked".into());
        let result = reconcile(&script, outcome(3, ""));
        assert_eq!(result.exit_code, 3);
        assert!(result.error.is_some());
        assert!(result.validation_errors.is_empty());
        assert!(!result.success());
    }

    #[test]
    fn reconcile_expected_failure_is_success() {
        let mut script = Script::default();
        script.expect_failure(2);
        let result = reconcile(&script, outcome(1, ""));
        assert!(result.success());
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn reconcile_expected_failure_that_succeeds_is_an_error() {
        let mut script = Script::default();
        script.expect_failure(2);
        let result = reconcile(&script, outcome(0, ""));
        assert!(!result.success());
        assert_eq!(result.error.as_deref(), Some(ASSERT_FAILURE_SUCCEEDED));
    }

    #[test]
    fn reconcile_expected_failure_still_validates() {
        let mut script = Script::default();
        script.expect_failure(2);
        script.expect_output(1, "ran first".into());
        let stdout = "### DOCCI_BLOCK_START_1 ###\nran first\n### DOCCI_BLOCK_END_1 ###\n";
        let result = reconcile(&script, outcome(1, stdout));
        assert!(result.success());

        let result = reconcile(&script, outcome(1, ""));
        assert!(!result.success());
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.validation_errors.len(), 1);
    }

    #[test]
    fn reconcile_validation_failure_synthesizes_exit_code() {
        let mut script = Script::default();
        script.expect_output(1, "needle".into());
        let stdout = "### DOCCI_BLOCK_START_1 ###\nhaystack only\n### DOCCI_BLOCK_END_1 ###\n";
        let result = reconcile(&script, outcome(0, stdout));
        assert!(!result.success());
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.validation_errors.len(), 1);
    }

    #[test]
    fn parse_documents_keeps_one_index_space() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_doc(&dir, "a.md", "```bash\necho a\n```\n");
        let second = write_doc(&dir, "b.md", "```bash\necho b\n```\n");
        let runner = Runner::new(RunOptions::default(), LogSink::default());
        let blocks = runner.parse_documents(&[first, second]).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].index, 1);
        assert_eq!(blocks[1].index, 2);
    }

    #[test]
    fn missing_document_is_not_found() {
        let runner = Runner::new(RunOptions::default(), LogSink::default());
        let err = runner
            .parse_documents(&[PathBuf::from("/no/such/doc-7f3a.md")])
            .unwrap_err();
        assert_eq!(err.category(), "not_found");
    }

    #[test]
    fn cross_document_background_kill_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_doc(&dir, "a.md", "```bash docci-background\nsleep 1\n```\n");
        let second = write_doc(&dir, "b.md", "```bash docci-background-kill=1\ntrue\n```\n");
        let runner = Runner::new(RunOptions::default(), LogSink::default());
        assert!(runner.parse_documents(&[first, second]).is_ok());

        let dangling = write_doc(&dir, "c.md", "```bash docci-background-kill=9\ntrue\n```\n");
        let err = runner.parse_documents(&[dangling]).unwrap_err();
        assert!(err
            .to_string()
            .contains("references a non-existent background process"));
    }

    #[tokio::test]
    async fn run_executes_blocks_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(
            &dir,
            "README.md",
            "```bash docci-output-contains=\"Persist test\"\necho \"Persist test\"\n```\n",
        );
        let runner = Runner::new(RunOptions::default(), LogSink::default());
        let result = runner.run(&[doc]).await.unwrap();
        assert!(result.success(), "errors: {:?}", result.validation_errors);
        assert!(result.stdout.contains("Persist test"));
    }

    #[tokio::test]
    async fn run_reports_expected_failure_as_success() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(
            &dir,
            "README.md",
            "```bash\necho ok\n```\n\n```bash docci-assert-failure\nexit 1\n```\n\n```bash\necho after\n```\n",
        );
        let runner = Runner::new(RunOptions::default(), LogSink::default());
        let result = runner.run(&[doc]).await.unwrap();
        assert!(result.success());
        // set -e semantics: the block after the expected failure never runs.
        assert!(!result.stdout.contains("after"));
    }

    #[tokio::test]
    async fn run_flags_expected_failure_that_succeeded() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(
            &dir,
            "README.md",
            "```bash docci-assert-failure\ntrue\n```\n",
        );
        let runner = Runner::new(RunOptions::default(), LogSink::default());
        let result = runner.run(&[doc]).await.unwrap();
        assert!(!result.success());
        assert_eq!(result.error.as_deref(), Some(ASSERT_FAILURE_SUCCEEDED));
    }

    #[tokio::test]
    async fn environment_persists_across_documents() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_doc(&dir, "a.md", "```bash\nexport DOCCI_TEST_VALUE=persisted\n```\n");
        let second = write_doc(
            &dir,
            "b.md",
            "```bash docci-output-contains=persisted\necho \"$DOCCI_TEST_VALUE\"\n```\n",
        );
        let runner = Runner::new(RunOptions::default(), LogSink::default());
        let result = runner.run(&[first, second]).await.unwrap();
        assert!(result.success(), "errors: {:?}", result.validation_errors);
    }

    #[test]
    fn retry_delay_default_applies_when_unset() {
        // Process-wide env var; only assert the default path here.
        if std::env::var(RETRY_DELAY_ENV_VAR).is_err() {
            assert_eq!(retry_delay_from_env().unwrap(), DEFAULT_RETRY_DELAY_SECS);
        }
    }
}
