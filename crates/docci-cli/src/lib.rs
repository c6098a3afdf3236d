//! docci CLI - run markdown documentation as tests.
//!
//! This is the entry point for the docci command-line interface. Command
//! implementations live in separate modules under [`commands`]; the heavy
//! lifting (parsing, synthesis, execution, validation) is in docci-core.

use anyhow::Result;
use clap::Parser;
use docci_core::LogSink;

mod cli;
mod commands;
mod utils;

use cli::{Cli, Commands};

/// Execute the docci CLI with the currently configured environment.
///
/// # Errors
///
/// Returns an error if logging initialization or command execution fails.
/// Run and validate failures exit the process directly with the mirrored
/// exit code instead of returning.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    utils::logging::initialize(cli.log_level)?;
    let log = LogSink::new(cli.log_level);

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, log).await,
        Commands::Validate { paths, format } => commands::validate::execute(&paths, format, log),
        Commands::Tags { format } => commands::tags::execute(format),
        Commands::Version => commands::version::execute(),
    }
}
