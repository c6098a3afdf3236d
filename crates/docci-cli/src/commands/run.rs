//! The `run` command: execute documents and mirror the result.
//!
//! Order of operations: kick off the best-effort release check, run the
//! pre-commands (a failure here aborts), run the documents through the
//! core pipeline, then always run the cleanup commands before reporting.
//! The process exits with the run result's exit code on failure and
//! prints a success banner on stdout otherwise.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use docci_core::{LogSink, RunOptions, Runner};
use tracing::warn;

use crate::cli::RunArgs;
use crate::commands::update;
use crate::utils::split_input_paths;

/// Execute `docci run`.
pub async fn execute(args: RunArgs, log: LogSink) -> Result<()> {
    let update_check = tokio::spawn(update::check_for_newer_release());

    let paths = split_input_paths(&args.paths);
    if paths.is_empty() {
        bail!("no input documents given");
    }

    run_hooks(&args.pre_commands, HookKind::Pre, &args).await?;

    let options = RunOptions {
        keep_running: args.keep_running,
        hide_background_logs: args.hide_background_logs,
        working_dir: args.working_dir.clone(),
    };
    let runner = Runner::new(options, log);
    let run_outcome = runner.run(&paths).await;

    // Cleanup commands always run, even when the run itself failed.
    run_hooks(&args.cleanup_commands, HookKind::Cleanup, &args).await?;

    if let Ok(Some(notice)) = update_check.await {
        eprintln!("{notice}");
    }

    let result = run_outcome?;
    if result.success() {
        println!(
            "{}",
            "All documentation blocks executed successfully".green().bold()
        );
        return Ok(());
    }

    if let Some(error) = &result.error {
        eprintln!("{} {error}", "error:".red().bold());
    }
    for validation_error in &result.validation_errors {
        eprintln!("{} {validation_error}", "validation:".red().bold());
    }
    std::process::exit(i32::try_from(result.exit_code).unwrap_or(1));
}

#[derive(Clone, Copy)]
enum HookKind {
    Pre,
    Cleanup,
}

impl HookKind {
    const fn label(self) -> &'static str {
        match self {
            Self::Pre => "pre-command",
            Self::Cleanup => "cleanup-command",
        }
    }
}

/// Run hook commands sequentially through the shell.
///
/// Pre-commands abort the run on failure; cleanup-command failures are
/// only warned about so every cleanup gets its chance.
async fn run_hooks(commands: &[String], kind: HookKind, args: &RunArgs) -> Result<()> {
    for command in commands {
        let mut shell = tokio::process::Command::new("bash");
        shell.arg("-c").arg(command);
        if let Some(dir) = &args.working_dir {
            shell.current_dir(dir);
        }
        let status = shell
            .status()
            .await
            .with_context(|| format!("failed to spawn {} '{command}'", kind.label()))?;

        if !status.success() {
            match kind {
                HookKind::Pre => {
                    bail!("{} '{command}' failed with status {status}", kind.label());
                },
                HookKind::Cleanup => {
                    warn!("{} '{command}' failed with status {status}", kind.label());
                },
            }
        }
    }
    Ok(())
}
