//! Plugin error types

use std::time::Duration;

use thiserror::Error;

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;

/// Errors raised by inputs, outputs and plugin construction
#[derive(Debug, Error)]
pub enum PluginError {
    /// Plugin settings could not be decoded or are inconsistent
    #[error("invalid {plugin} configuration: {message}")]
    Config {
        /// Plugin type name
        plugin: String,
        /// What was wrong
        message: String,
    },

    /// Output failed to connect to its sink
    #[error("connect failed: {0}")]
    Connect(String),

    /// Output failed to deliver an item
    #[error("write failed: {0}")]
    Write(String),

    /// Remote request failed
    #[error("request failed: {0}")]
    Request(String),

    /// Input did not finish within its gather window
    #[error("took longer to collect than collection interval ({0:?})")]
    Timeout(Duration),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl PluginError {
    /// Create a Config error
    pub fn config(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Create a Request error from any displayable error
    pub fn request(err: impl std::fmt::Display) -> Self {
        Self::Request(err.to_string())
    }

    /// Create a Write error from any displayable error
    pub fn write(err: impl std::fmt::Display) -> Self {
        Self::Write(err.to_string())
    }

    /// Create an Other error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<toml::de::Error> for PluginError {
    fn from(err: toml::de::Error) -> Self {
        Self::Other(format!("invalid settings: {}", err.message()))
    }
}
