//! Logging initialization.
//!
//! Installs the tracing subscriber that docci-core's log-sink handles
//! emit through. Everything goes to stderr so the executed documents own
//! stdout.

use anyhow::Result;
use docci_core::LogLevel;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize the logging subsystem at the requested level.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize(level: LogLevel) -> Result<()> {
    let max_level = match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(max_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
