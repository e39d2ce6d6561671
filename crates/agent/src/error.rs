//! Agent error types
//!
//! Only startup problems and test-mode failures surface as errors; runtime
//! input and output failures are logged where they happen.

use gde_config::ConfigError;
use gde_core::PluginError;
use thiserror::Error;

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent errors
#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Nothing to collect
    #[error("no inputs found, did you provide a valid config file?")]
    NoInputs,

    /// Nowhere to deliver
    #[error("no outputs found, did you provide a valid config file?")]
    NoOutputs,

    /// Agent interval is zero
    #[error("agent interval must be greater than zero")]
    InvalidInterval,

    /// Config names a plugin nobody registered
    #[error("undefined but requested {section}: {name}")]
    UnknownPlugin {
        /// "input" or "output"
        section: &'static str,
        /// Plugin type name
        name: String,
    },

    /// Plugin constructor rejected its settings
    #[error("failed to create {section} '{name}': {source}")]
    Plugin {
        /// "input" or "output"
        section: &'static str,
        /// Plugin type name
        name: String,
        /// Constructor error
        #[source]
        source: PluginError,
    },

    /// Output failed to connect
    #[error("error connecting to output '{output}': {source}")]
    Connect {
        /// Output name
        output: String,
        /// Connect error
        #[source]
        source: PluginError,
    },

    /// Input failed during a test run
    #[error("error in input '{input}': {source}")]
    Input {
        /// Qualified input name
        input: String,
        /// Process error
        #[source]
        source: PluginError,
    },

    /// Input panicked during a test run
    #[error("input '{input}' panicked: {message}")]
    InputPanicked {
        /// Qualified input name
        input: String,
        /// Panic payload
        message: String,
    },
}

impl AgentError {
    /// Create an UnknownPlugin error
    pub fn unknown_plugin(section: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownPlugin {
            section,
            name: name.into(),
        }
    }

    /// Create a Plugin error
    pub fn plugin(section: &'static str, name: impl Into<String>, source: PluginError) -> Self {
        Self::Plugin {
            section,
            name: name.into(),
            source,
        }
    }
}
