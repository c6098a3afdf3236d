//! Shell execution with concurrent output streaming and capture.
//!
//! The executor spawns `bash -c <script>` with both stdio streams piped,
//! then runs two sibling tasks, one per stream, reading line by line.
//! Live stdout suppresses internal plumbing (block markers, the cleanup
//! notice, debug block headers); live stderr passes everything through.
//! Both tasks append every raw line, filtered or not, to capture buffers
//! behind a single mutex, one append per line. Only after both readers
//! drain is the subprocess awaited, and its termination mapped into an
//! [`ExecutionOutcome`].
//!
//! A non-zero exit is *data* here, not an error: assert-failure semantics
//! are reconciled downstream. Errors from this module mean the run could
//! not happen at all (no shell, no pipes, a wait failure).

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout, Command};

use crate::error::{Error, Result};
use crate::logging::LogSink;
use crate::markers;

/// Environment variable set to `true` in the child shell, signaling that
/// the script is being run by the tool.
pub const RUNNER_ENV_VAR: &str = "DOCCI_RUNNING";

/// Capacity of each stream reader's buffer.
const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Executor configuration.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Directory the shell starts in; inherited from the parent when
    /// unset. Must exist.
    pub working_dir: Option<PathBuf>,
}

/// The result of one script execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// The shell's exit code; signal deaths map to `128 + signal`.
    pub exit_code: u32,
    /// Present when `exit_code` is non-zero.
    pub error: Option<String>,
    /// Every stdout line, including filtered internal lines.
    pub stdout: String,
    /// Every stderr line.
    pub stderr: String,
}

/// Both capture buffers, guarded together by one mutex.
#[derive(Debug, Default)]
struct Captured {
    stdout: String,
    stderr: String,
}

/// Runs synthesized scripts in a bash subprocess.
#[derive(Debug)]
pub struct Executor {
    opts: ExecOptions,
    log: LogSink,
}

impl Executor {
    /// Create an executor with the given options and log sink.
    #[must_use]
    pub const fn new(opts: ExecOptions, log: LogSink) -> Self {
        Self { opts, log }
    }

    /// Execute `script` and return its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing working directory,
    /// [`Error::Spawn`] when bash cannot be launched or a pipe is
    /// unobtainable, and [`Error::Execution`] when waiting on a reader
    /// task or the subprocess fails unexpectedly.
    pub async fn execute(&self, script: &str) -> Result<ExecutionOutcome> {
        if let Some(dir) = &self.opts.working_dir {
            if !dir.is_dir() {
                return Err(Error::NotFound(format!(
                    "working directory '{}' does not exist",
                    dir.display()
                )));
            }
        }

        self.log.debug(&format!(
            "executing synthesized script ({} bytes)",
            script.len()
        ));

        let mut command = Command::new("bash");
        command
            .arg("-c")
            .arg(script)
            .env(RUNNER_ENV_VAR, "true")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.opts.working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|err| Error::Spawn(format!("failed to spawn bash: {err}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn("stdout pipe unobtainable".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Spawn("stderr pipe unobtainable".into()))?;

        let captured = Arc::new(Mutex::new(Captured::default()));
        let stdout_task = tokio::spawn(pump_stdout(stdout, Arc::clone(&captured)));
        let stderr_task = tokio::spawn(pump_stderr(stderr, Arc::clone(&captured)));

        // Both readers must drain before the child is reaped, so every
        // line written before exit lands in the captures.
        stdout_task
            .await
            .map_err(|err| Error::Execution(format!("stdout reader failed: {err}")))?;
        stderr_task
            .await
            .map_err(|err| Error::Execution(format!("stderr reader failed: {err}")))?;

        let status = child
            .wait()
            .await
            .map_err(|err| Error::Execution(format!("waiting on shell failed: {err}")))?;

        let (stdout, stderr) = {
            let guard = captured.lock().unwrap_or_else(PoisonError::into_inner);
            (guard.stdout.clone(), guard.stderr.clone())
        };

        let exit_code = exit_code_of(status);
        let error = (exit_code != 0).then(|| format!("script exited with status {exit_code}"));
        self.log
            .debug(&format!("shell finished with exit code {exit_code}"));

        Ok(ExecutionOutcome {
            exit_code,
            error,
            stdout,
            stderr,
        })
    }
}

/// Map an [`ExitStatus`] to the result's unsigned exit code.
fn exit_code_of(status: ExitStatus) -> u32 {
    if let Some(code) = status.code() {
        return u32::try_from(code).unwrap_or(1);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + u32::try_from(signal).unwrap_or(0);
        }
    }
    1
}

/// Stream stdout: suppress internal lines live, capture every raw line.
async fn pump_stdout(stream: ChildStdout, captured: Arc<Mutex<Captured>>) {
    let mut lines = BufReader::with_capacity(READ_BUFFER_BYTES, stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if !markers::is_internal_stdout_line(&line) {
            println!("{line}");
        }
        let mut guard = captured.lock().unwrap_or_else(PoisonError::into_inner);
        guard.stdout.push_str(&line);
        guard.stdout.push('\n');
    }
}

/// Stream stderr: pass everything through live, capture every raw line.
async fn pump_stderr(stream: ChildStderr, captured: Arc<Mutex<Captured>>) {
    let mut lines = BufReader::with_capacity(READ_BUFFER_BYTES, stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        eprintln!("{line}");
        let mut guard = captured.lock().unwrap_or_else(PoisonError::into_inner);
        guard.stderr.push_str(&line);
        guard.stderr.push('\n');
    }
}
