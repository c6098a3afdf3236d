//! # CLI structure and argument parsing
//!
//! Defines the command-line interface for `docci` using clap derive
//! macros. The CLI follows a command-subcommand pattern:
//!
//! - **Global options**: `--log-level` applies to every command
//! - **Subcommands**: `run`, `validate`, `tags`, `version`
//!
//! ## Usage patterns
//!
//! ```bash
//! # Run a single document
//! docci run README.md
//!
//! # Run several documents as one shell session
//! docci run docs/setup.md,docs/usage.md
//!
//! # Check documents without executing anything
//! docci validate README.md
//!
//! # Explore the tag vocabulary
//! docci tags
//! docci tags --format json
//! ```
//!
//! The process exit code mirrors the run result: 0 on full success, the
//! script's (or a synthesized) non-zero code otherwise.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use docci_core::LogLevel;

/// Main CLI structure for the `docci` command.
#[derive(Parser, Clone, Debug)]
#[command(name = "docci")]
#[command(version)]
#[command(about = "docci - run markdown documentation as tests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "info",
        env = "DOCCI_LOG_LEVEL",
        value_parser = parse_log_level
    )]
    pub log_level: LogLevel,
}

fn parse_log_level(raw: &str) -> Result<LogLevel, String> {
    raw.parse()
}

/// Available subcommands for the `docci` CLI.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Execute the shell blocks of one or more markdown documents
    Run(RunArgs),

    /// Parse documents and report their blocks without executing anything
    Validate {
        /// Markdown file, or comma-separated list of files
        #[arg(value_name = "PATHS")]
        paths: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List every supported docci tag with its aliases and value shape
    Tags {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print build metadata as JSON
    Version,
}

/// Arguments for `docci run`.
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Markdown file, or comma-separated list of files executed as one
    /// shell session
    #[arg(value_name = "PATHS")]
    pub paths: String,

    /// Command to run before the documents execute (repeatable); a
    /// failing pre-command aborts the run
    #[arg(long = "pre-commands", value_name = "CMD")]
    pub pre_commands: Vec<String>,

    /// Command to always run after the documents execute (repeatable)
    #[arg(long = "cleanup-commands", value_name = "CMD")]
    pub cleanup_commands: Vec<String>,

    /// Delete background scratch logs without replaying them
    #[arg(long)]
    pub hide_background_logs: bool,

    /// Directory the shell starts in
    #[arg(long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Keep the shell alive after all blocks complete (Ctrl+C to stop)
    #[arg(long)]
    pub keep_running: bool,
}

/// Output format for informational commands.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_repeated_hooks() {
        let cli = Cli::try_parse_from([
            "docci",
            "run",
            "README.md",
            "--pre-commands",
            "echo pre1",
            "--pre-commands",
            "echo pre2",
            "--cleanup-commands",
            "echo post",
            "--hide-background-logs",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.paths, "README.md");
        assert_eq!(args.pre_commands, vec!["echo pre1", "echo pre2"]);
        assert_eq!(args.cleanup_commands, vec!["echo post"]);
        assert!(args.hide_background_logs);
        assert!(!args.keep_running);
    }

    #[test]
    fn log_level_parses_globally() {
        let cli = Cli::try_parse_from(["docci", "tags", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(Cli::try_parse_from(["docci", "tags", "--log-level", "shout"]).is_err());
    }

    #[test]
    fn tags_format_defaults_to_text() {
        let cli = Cli::try_parse_from(["docci", "tags"]).unwrap();
        let Commands::Tags { format } = cli.command else {
            panic!("expected tags command");
        };
        assert_eq!(format, OutputFormat::Text);
    }
}
