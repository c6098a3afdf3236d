//! Log-sink capability handed to each pipeline component.
//!
//! docci-core deliberately has no mutable global logger. Components that
//! want to log receive a [`LogSink`] handle carrying a level filter;
//! emission is delegated to the `tracing` facade, and the binary installs
//! the actual stderr writer. The handle exists for two reasons: it keeps
//! the core free of global state, and it lets components *ask* about the
//! active level: the synthesizer emits per-block debug header lines only
//! when [`LogSink::debug_enabled`] says so.

use std::fmt;
use std::str::FromStr;

/// Verbosity levels, ordered from least to most chatty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    Warn,
    /// Normal operational output. The default.
    #[default]
    Info,
    /// Adds per-component diagnostics and script block headers.
    Debug,
    /// Everything, including per-line noise.
    Trace,
}

impl LogLevel {
    /// All levels in ascending verbosity, for help text.
    pub const ALL: [Self; 5] = [
        Self::Error,
        Self::Warn,
        Self::Info,
        Self::Debug,
        Self::Trace,
    ];

    /// The lowercase name of this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!(
                "unknown log level '{other}' (expected one of: error, warn, info, debug, trace)"
            )),
        }
    }
}

/// Cheap cloneable logging handle with a level filter.
///
/// Default construction yields an Info-level sink writing to stderr
/// (through whatever `tracing` subscriber the host process installed).
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    level: LogLevel,
}

impl LogSink {
    /// Create a sink filtering at `level`.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// The configured filter level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Whether messages at `level` pass the filter.
    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level
    }

    /// Whether debug-level output (including synthesized block headers)
    /// is active.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.enabled(LogLevel::Debug)
    }

    /// Emit an error-level message.
    pub fn error(&self, message: &str) {
        if self.enabled(LogLevel::Error) {
            tracing::error!("{message}");
        }
    }

    /// Emit a warning.
    pub fn warn(&self, message: &str) {
        if self.enabled(LogLevel::Warn) {
            tracing::warn!("{message}");
        }
    }

    /// Emit an informational message.
    pub fn info(&self, message: &str) {
        if self.enabled(LogLevel::Info) {
            tracing::info!("{message}");
        }
    }

    /// Emit a debug message.
    pub fn debug(&self, message: &str) {
        if self.enabled(LogLevel::Debug) {
            tracing::debug!("{message}");
        }
    }

    /// Emit a trace message.
    pub fn trace(&self, message: &str) {
        if self.enabled(LogLevel::Trace) {
            tracing::trace!("{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_info() {
        let sink = LogSink::default();
        assert_eq!(sink.level(), LogLevel::Info);
        assert!(sink.enabled(LogLevel::Warn));
        assert!(sink.enabled(LogLevel::Info));
        assert!(!sink.debug_enabled());
    }

    #[test]
    fn debug_sink_enables_headers() {
        let sink = LogSink::new(LogLevel::Debug);
        assert!(sink.debug_enabled());
        assert!(!sink.enabled(LogLevel::Trace));
    }

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("trace".parse::<LogLevel>(), Ok(LogLevel::Trace));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn levels_round_trip_through_display() {
        for level in LogLevel::ALL {
            assert_eq!(level.to_string().parse::<LogLevel>(), Ok(level));
        }
    }
}
