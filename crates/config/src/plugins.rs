//! Plugin sections
//!
//! `[[inputs.<type>]]` and `[[outputs.<type>]]` are arrays of tables keyed
//! by plugin type name. Each table becomes one [`PluginConfig`]; the agent
//! pulls out the keys it owns (`interval`, `timeout` for inputs) and hands
//! the remaining settings to the plugin constructor.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Keys on an input table that belong to the agent, not the plugin
const INPUT_AGENT_KEYS: &[&str] = &["interval", "timeout"];

/// One configured plugin instance
#[derive(Debug, Clone, PartialEq)]
pub struct PluginConfig {
    /// Plugin type name (`grafana`, `file`, ...)
    pub plugin: String,

    /// Own collection interval, overriding the agent interval (inputs only)
    pub interval: Option<Duration>,

    /// Own gather timeout; defaults to the effective interval (inputs only)
    pub timeout: Option<Duration>,

    /// Plugin-specific settings
    pub settings: toml::Table,
}

impl PluginConfig {
    /// A plugin with no settings
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            interval: None,
            timeout: None,
            settings: toml::Table::new(),
        }
    }

    /// Set the plugin settings
    pub fn with_settings(mut self, settings: toml::Table) -> Self {
        self.settings = settings;
        self
    }

    /// Set the own interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct AgentKeys {
    #[serde(default, with = "humantime_serde")]
    interval: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    timeout: Option<Duration>,
}

/// Convert a raw `inputs` section
pub(crate) fn parse_inputs(raw: BTreeMap<String, toml::Value>) -> Result<Vec<PluginConfig>> {
    let mut configs = Vec::new();
    for (plugin, value) in raw {
        for mut settings in tables("inputs", &plugin, value)? {
            let mut keys = toml::Table::new();
            for key in INPUT_AGENT_KEYS {
                if let Some(v) = settings.remove(*key) {
                    keys.insert((*key).to_string(), v);
                }
            }

            let keys: AgentKeys = toml::Value::Table(keys).try_into().map_err(|e| {
                ConfigError::invalid_value("input", &plugin, "interval/timeout", format!("{e}"))
            })?;

            configs.push(PluginConfig {
                plugin: plugin.clone(),
                interval: keys.interval,
                timeout: keys.timeout,
                settings,
            });
        }
    }
    Ok(configs)
}

/// Convert a raw `outputs` section
pub(crate) fn parse_outputs(raw: BTreeMap<String, toml::Value>) -> Result<Vec<PluginConfig>> {
    let mut configs = Vec::new();
    for (plugin, value) in raw {
        for settings in tables("outputs", &plugin, value)? {
            configs.push(PluginConfig::new(plugin.clone()).with_settings(settings));
        }
    }
    Ok(configs)
}

fn tables(section: &'static str, plugin: &str, value: toml::Value) -> Result<Vec<toml::Table>> {
    let toml::Value::Array(items) = value else {
        return Err(ConfigError::not_an_array(section, plugin));
    };

    items
        .into_iter()
        .map(|item| match item {
            toml::Value::Table(table) => Ok(table),
            _ => Err(ConfigError::not_an_array(section, plugin)),
        })
        .collect()
}
