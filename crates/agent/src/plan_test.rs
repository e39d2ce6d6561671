//! Tests for plan construction and validation

use std::str::FromStr;
use std::time::Duration;

use gde_config::Config;
use gde_core::{Input, Output, PluginError, Registry};

use super::{Filters, Plan, RunMode};
use crate::error::AgentError;
use crate::testing::{RecordingOutput, ScriptedInput};

fn scripted(_: &toml::Table) -> gde_core::Result<Box<dyn Input>> {
    Ok(Box::new(ScriptedInput::default()))
}

fn picky(settings: &toml::Table) -> gde_core::Result<Box<dyn Input>> {
    if settings.contains_key("host") {
        Ok(Box::new(ScriptedInput::default()))
    } else {
        Err(PluginError::config("picky", "host is required"))
    }
}

fn recording(_: &toml::Table) -> gde_core::Result<Box<dyn Output>> {
    Ok(Box::new(RecordingOutput::default()))
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.add_input("scripted", scripted);
    registry.add_input("picky", picky);
    registry.add_output("recording", recording);
    registry.add_output("other", recording);
    registry
}

// =============================================================================
// Filters
// =============================================================================

#[test]
fn test_filters_parse() {
    let filters = Filters::parse(Some("grafana:cpu"), None);
    assert_eq!(filters.inputs, vec!["grafana", "cpu"]);
    assert!(filters.outputs.is_empty());

    assert!(filters.allows_input("cpu"));
    assert!(!filters.allows_input("mem"));
    assert!(filters.allows_output("anything"));
}

#[test]
fn test_filters_ignore_empty_segments() {
    let filters = Filters::parse(Some(":file::"), Some(""));
    assert_eq!(filters.inputs, vec!["file"]);
    assert!(filters.outputs.is_empty());
}

// =============================================================================
// Build
// =============================================================================

#[test]
fn test_build_qualifies_input_names() {
    let config = Config::from_str(
        r#"
[[inputs.scripted]]
interval = "1m"
timeout = "20s"

[[outputs.recording]]
"#,
    )
    .unwrap();

    let plan = Plan::build(&config, &registry(), &Filters::default(), RunMode::Run).unwrap();
    assert_eq!(plan.input_names(), vec!["inputs.scripted"]);
    assert_eq!(plan.output_names(), vec!["recording"]);
    assert_eq!(plan.inputs[0].interval, Some(Duration::from_secs(60)));
    assert_eq!(plan.inputs[0].timeout, Some(Duration::from_secs(20)));
}

#[test]
fn test_build_applies_filters() {
    let config = Config::from_str(
        r#"
[[inputs.scripted]]
[[inputs.picky]]
host = "x"

[[outputs.recording]]
[[outputs.other]]
"#,
    )
    .unwrap();

    let filters = Filters::parse(Some("picky"), Some("other"));
    let plan = Plan::build(&config, &registry(), &filters, RunMode::Run).unwrap();
    assert_eq!(plan.input_names(), vec!["inputs.picky"]);
    assert_eq!(plan.output_names(), vec!["other"]);
}

#[test]
fn test_build_unknown_plugin() {
    let config = Config::from_str("[[inputs.prometheus]]\n[[outputs.recording]]\n").unwrap();

    let err = Plan::build(&config, &registry(), &Filters::default(), RunMode::Run).unwrap_err();
    assert_eq!(err.to_string(), "undefined but requested input: prometheus");
}

#[test]
fn test_build_plugin_rejects_settings() {
    let config = Config::from_str("[[inputs.picky]]\n[[outputs.recording]]\n").unwrap();

    let err = Plan::build(&config, &registry(), &Filters::default(), RunMode::Run).unwrap_err();
    assert!(matches!(err, AgentError::Plugin { section: "input", .. }));
    assert!(err.to_string().contains("host is required"));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_no_inputs_is_fatal() {
    let config = Config::from_str("[[outputs.recording]]\n").unwrap();
    let err = Plan::build(&config, &registry(), &Filters::default(), RunMode::Run).unwrap_err();
    assert!(matches!(err, AgentError::NoInputs));
}

#[test]
fn test_no_outputs_is_fatal_outside_test_mode() {
    let config = Config::from_str("[[inputs.scripted]]\n").unwrap();

    let err = Plan::build(&config, &registry(), &Filters::default(), RunMode::Run).unwrap_err();
    assert!(matches!(err, AgentError::NoOutputs));

    let plan = Plan::build(&config, &registry(), &Filters::default(), RunMode::Test).unwrap();
    assert!(plan.outputs.is_empty());
}

#[test]
fn test_filtered_to_nothing_is_fatal() {
    let config = Config::from_str("[[inputs.scripted]]\n[[outputs.recording]]\n").unwrap();
    let filters = Filters::parse(Some("picky"), None);

    let err = Plan::build(&config, &registry(), &filters, RunMode::Run).unwrap_err();
    assert!(matches!(err, AgentError::NoInputs));
}

#[test]
fn test_zero_interval_is_fatal() {
    let mut config = Config::from_str("[[inputs.scripted]]\n[[outputs.recording]]\n").unwrap();
    config.agent.interval = Duration::ZERO;

    let err = Plan::build(&config, &registry(), &Filters::default(), RunMode::Run).unwrap_err();
    assert!(matches!(err, AgentError::InvalidInterval));
}
