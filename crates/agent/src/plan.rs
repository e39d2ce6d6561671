//! Agent plan - configured plugin instances
//!
//! A [`Plan`] is built once per run cycle from the parsed [`Config`] and
//! the plugin [`Registry`]. It owns every plugin instance for the cycle;
//! nothing downstream copies them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use gde_config::{AgentConfig, Config};
use gde_core::{Input, Output, Registry};
use tracing::debug;

use crate::error::{AgentError, Result};

/// Prefix of qualified input names
const INPUT_PREFIX: &str = "inputs.";

/// Whether the plan will be run for real or only tested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Periodic collection with outputs
    Run,
    /// Every input once, items discarded
    Test,
}

/// Colon-separated plugin name filters from the command line
///
/// An empty filter lets everything through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Allowed input plugin names
    pub inputs: Vec<String>,
    /// Allowed output plugin names
    pub outputs: Vec<String>,
}

impl Filters {
    /// Parse `a:b:c` style filters; `None` or empty strings mean no filter
    pub fn parse(inputs: Option<&str>, outputs: Option<&str>) -> Self {
        Self {
            inputs: split(inputs),
            outputs: split(outputs),
        }
    }

    /// Whether an input plugin passes the filter
    pub fn allows_input(&self, name: &str) -> bool {
        self.inputs.is_empty() || self.inputs.iter().any(|n| n == name)
    }

    /// Whether an output plugin passes the filter
    pub fn allows_output(&self, name: &str) -> bool {
        self.outputs.is_empty() || self.outputs.iter().any(|n| n == name)
    }
}

fn split(filter: Option<&str>) -> Vec<String> {
    filter
        .map(|f| {
            f.split(':')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// A configured input
pub struct RunningInput {
    /// Qualified name (`inputs.<plugin>`)
    pub name: Arc<str>,
    /// The plugin instance
    pub input: Arc<dyn Input>,
    /// Own interval, overriding the agent interval
    pub interval: Option<Duration>,
    /// Own gather timeout, defaulting to the effective interval
    pub timeout: Option<Duration>,
}

impl RunningInput {
    /// Wrap an input built for `plugin`
    pub fn new(plugin: &str, input: Arc<dyn Input>) -> Self {
        Self {
            name: format!("{}{}", INPUT_PREFIX, plugin).into(),
            input,
            interval: None,
            timeout: None,
        }
    }

    /// Set the own interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set the gather timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for RunningInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningInput")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A configured output
pub struct RunningOutput {
    /// Plugin name
    pub name: String,
    /// The plugin instance
    pub output: Box<dyn Output>,
}

impl RunningOutput {
    /// Wrap an output built for `plugin`
    pub fn new(plugin: impl Into<String>, output: Box<dyn Output>) -> Self {
        Self {
            name: plugin.into(),
            output,
        }
    }
}

impl fmt::Debug for RunningOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningOutput")
            .field("name", &self.name)
            .finish()
    }
}

/// Everything one run cycle needs
#[derive(Debug)]
pub struct Plan {
    /// Agent-wide settings
    pub agent: AgentConfig,
    /// Configured inputs, in config order
    pub inputs: Vec<RunningInput>,
    /// Configured outputs, in config order
    pub outputs: Vec<RunningOutput>,
}

impl Plan {
    /// Instantiate every configured plugin that passes the filters
    ///
    /// # Errors
    ///
    /// Fails on unknown plugin names, rejected plugin settings, or when the
    /// result cannot be run in `mode` (see [`Plan::validate`]).
    pub fn build(config: &Config, registry: &Registry, filters: &Filters, mode: RunMode) -> Result<Self> {
        let mut inputs = Vec::new();
        for entry in &config.inputs {
            if !filters.allows_input(&entry.plugin) {
                debug!(input = %entry.plugin, "input filtered out");
                continue;
            }

            let factory = registry
                .input(&entry.plugin)
                .ok_or_else(|| AgentError::unknown_plugin("input", &entry.plugin))?;
            let input = factory(&entry.settings)
                .map_err(|e| AgentError::plugin("input", &entry.plugin, e))?;

            let mut running = RunningInput::new(&entry.plugin, Arc::from(input));
            running.interval = entry.interval;
            running.timeout = entry.timeout;
            inputs.push(running);
        }

        let mut outputs = Vec::new();
        for entry in &config.outputs {
            if !filters.allows_output(&entry.plugin) {
                debug!(output = %entry.plugin, "output filtered out");
                continue;
            }

            let factory = registry
                .output(&entry.plugin)
                .ok_or_else(|| AgentError::unknown_plugin("output", &entry.plugin))?;
            let output = factory(&entry.settings)
                .map_err(|e| AgentError::plugin("output", &entry.plugin, e))?;

            outputs.push(RunningOutput::new(&entry.plugin, output));
        }

        let plan = Self {
            agent: config.agent.clone(),
            inputs,
            outputs,
        };
        plan.validate(mode)?;
        Ok(plan)
    }

    /// Check the plan can start
    ///
    /// Requires at least one input, at least one output outside test mode,
    /// and a positive interval.
    pub fn validate(&self, mode: RunMode) -> Result<()> {
        if self.outputs.is_empty() && mode == RunMode::Run {
            return Err(AgentError::NoOutputs);
        }
        if self.inputs.is_empty() {
            return Err(AgentError::NoInputs);
        }
        if self.agent.interval.is_zero() {
            return Err(AgentError::InvalidInterval);
        }
        Ok(())
    }

    /// Qualified input names, in order
    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|i| &*i.name).collect()
    }

    /// Output names, in order
    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|o| o.name.as_str()).collect()
    }
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod plan_test;
