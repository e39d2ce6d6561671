//! Logging settings
//!
//! The agent section carries `debug`, `quiet` and `logfile`; this module
//! folds them into a single [`LogSettings`] value the binary applies at the
//! start of every run cycle.

use std::path::PathBuf;

use serde::Deserialize;

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug level - debugging information
    Debug,
    /// Info level - normal operation (default)
    #[default]
    Info,
    /// Error level - errors only
    Error,
}

impl LogLevel {
    /// Convert to tracing level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Error => "error",
        }
    }

    /// Resolve the level from the debug/quiet switches
    ///
    /// `quiet` wins over `debug`.
    pub fn from_switches(debug: bool, quiet: bool) -> Self {
        if quiet {
            Self::Error
        } else if debug {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// JSON structured logging
    Json,
}

/// Effective logging settings for one run cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Level filter
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Log file; `None` means stderr
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Console,
            file: None,
        }
    }
}
