//! Agent-wide settings
//!
//! The `[agent]` section. Every field has a default, so a config file
//! without the section is valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::logging::{LogFormat, LogLevel, LogSettings};

/// Agent schedule and runtime settings
///
/// # Example
///
/// ```toml
/// [agent]
/// interval = "10s"
/// round_interval = true
/// debug = false
/// quiet = false
/// logfile = ""
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Default collection interval for all inputs
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Align the first collection to a multiple of `interval`
    /// Default: true
    pub round_interval: bool,

    /// Log at debug level
    pub debug: bool,

    /// Log errors only
    pub quiet: bool,

    /// Log file path; empty means stderr
    pub logfile: String,

    /// Log output format (console, json)
    /// Default: console
    pub log_format: LogFormat,

    /// Capacity of the shared item channel
    /// Default: 100
    pub queue_size: usize,

    /// How long to wait for workers after shutdown is signalled
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            round_interval: true,
            debug: false,
            quiet: false,
            logfile: String::new(),
            log_format: LogFormat::Console,
            queue_size: 100,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl AgentConfig {
    /// Logging settings with optional command-line overrides
    ///
    /// A `true` override forces the switch on; `false` leaves the file value.
    pub fn log_settings(&self, debug: bool, quiet: bool) -> LogSettings {
        LogSettings {
            level: LogLevel::from_switches(self.debug || debug, self.quiet || quiet),
            format: self.log_format,
            file: (!self.logfile.is_empty()).then(|| PathBuf::from(&self.logfile)),
        }
    }
}
