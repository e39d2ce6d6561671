//! Configuration validation
//!
//! Checks that only depend on the file itself:
//! - Agent interval and queue size are positive
//! - Per-input interval and timeout overrides are positive
//!
//! Whether inputs and outputs are present depends on the run mode and is
//! checked when the agent plan is built.

use std::time::Duration;

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_agent(config)?;
    validate_inputs(config)?;
    Ok(())
}

fn validate_agent(config: &Config) -> Result<()> {
    if config.agent.interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "agent",
            "agent",
            "interval",
            "must be greater than zero",
        ));
    }

    if config.agent.queue_size == 0 {
        return Err(ConfigError::invalid_value(
            "agent",
            "agent",
            "queue_size",
            "must be greater than zero",
        ));
    }

    Ok(())
}

fn validate_inputs(config: &Config) -> Result<()> {
    for input in &config.inputs {
        check_positive(&input.plugin, "interval", input.interval)?;
        check_positive(&input.plugin, "timeout", input.timeout)?;
    }
    Ok(())
}

fn check_positive(plugin: &str, field: &'static str, value: Option<Duration>) -> Result<()> {
    match value {
        Some(d) if d.is_zero() => Err(ConfigError::invalid_value(
            "input",
            plugin,
            field,
            "must be greater than zero",
        )),
        _ => Ok(()),
    }
}
