//! gde Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use gde_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[[outputs.file]]\noutput_dir = \"/tmp/gde\"").unwrap();
//! assert_eq!(config.outputs.len(), 1);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [agent]
//! interval = "10s"
//!
//! [[inputs.grafana]]
//! host = "http://localhost:3000"
//! authorization = "$GRAFANA_TOKEN"
//!
//! [[outputs.file]]
//! output_dir = "/tmp/gde"
//! output_format = "zip"
//! ```
//!
//! `$NAME` tokens are replaced from the environment before parsing.

mod agent;
mod env;
mod error;
mod logging;
mod plugins;
mod validation;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use agent::AgentConfig;
pub use env::{substitute, substitute_with};
pub use error::{ConfigError, Result};
pub use logging::{LogFormat, LogLevel, LogSettings};
pub use plugins::PluginConfig;

use serde::Deserialize;
use tracing::debug;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "GDE_CONFIG_PATH";

/// System-wide config location
pub const SYSTEM_CONFIG_PATH: &str = "/etc/gde/gde.conf";

/// Main configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Agent-wide settings
    pub agent: AgentConfig,

    /// Configured inputs, grouped by plugin name (sorted), file order within a plugin
    pub inputs: Vec<PluginConfig>,

    /// Configured outputs, same ordering as inputs
    pub outputs: Vec<PluginConfig>,

    /// `[agent]` keys seen so far, later files layered on top
    agent_table: toml::Table,
}

/// File layout before plugin sections are split into instances
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    agent: Option<toml::Table>,
    inputs: BTreeMap<String, toml::Value>,
    outputs: BTreeMap<String, toml::Value>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = read(path)?;
        Self::from_str(&contents)
    }

    /// Append every `*.conf` file in `dir`, in file name order
    ///
    /// Inputs and outputs are appended. Keys of an `[agent]` section
    /// override the same keys loaded before; other agent settings keep
    /// their current values.
    pub fn load_directory<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| ConfigError::io(dir.display().to_string(), e))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "conf"))
            .collect();
        files.sort();

        for path in files {
            debug!(path = %path.display(), "loading config file");
            let raw = parse_raw(&read(&path)?)?;
            if let Some(table) = raw.agent {
                self.agent_table.extend(table);
                self.agent = decode_agent(&self.agent_table)?;
            }
            self.inputs.extend(plugins::parse_inputs(raw.inputs)?);
            self.outputs.extend(plugins::parse_outputs(raw.outputs)?);
        }

        self.validate()
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let raw = parse_raw(s)?;
        let agent_table = raw.agent.unwrap_or_default();
        let config = Config {
            agent: decode_agent(&agent_table)?,
            inputs: plugins::parse_inputs(raw.inputs)?,
            outputs: plugins::parse_outputs(raw.outputs)?,
            agent_table,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Plugin names of configured inputs, in order
    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|p| p.plugin.as_str()).collect()
    }

    /// Plugin names of configured outputs, in order
    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|p| p.plugin.as_str()).collect()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::io(path.display().to_string(), e))
}

fn parse_raw(s: &str) -> Result<RawConfig> {
    let text = env::substitute(s);
    toml::from_str(&text).map_err(ConfigError::ParseError)
}

fn decode_agent(table: &toml::Table) -> Result<AgentConfig> {
    toml::Value::Table(table.clone())
        .try_into()
        .map_err(ConfigError::ParseError)
}

/// Find the config file when none was given on the command line
///
/// Order: `$GDE_CONFIG_PATH`, `$HOME/.gde/gde.conf`, `/etc/gde/gde.conf`.
pub fn default_config_path() -> Result<PathBuf> {
    locate(
        std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
        Path::new(SYSTEM_CONFIG_PATH),
    )
}

fn locate(from_env: Option<PathBuf>, home: Option<PathBuf>, system: &Path) -> Result<PathBuf> {
    let candidates: Vec<PathBuf> = from_env
        .into_iter()
        .chain(home.map(|h| h.join(".gde").join("gde.conf")))
        .chain(std::iter::once(system.to_path_buf()))
        .collect();

    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| ConfigError::NotFound {
            tried: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}
