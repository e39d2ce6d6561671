use super::*;
use std::str::FromStr;

use gde_agent::{Plan, RunMode};
use gde_config::Config;

use crate::cmd::registry;

// =============================================================================
// Sample config
// =============================================================================

#[test]
fn test_sample_config_enables_defaults_only() {
    let sample = sample_config(&registry(), &Filters::default()).unwrap();

    assert!(sample.starts_with("# gde configuration"));
    assert!(sample.contains("\n[[outputs.file]]\n"));
    assert!(sample.contains("\n[[inputs.grafana]]\n"));
    assert!(sample.contains("\n# [[outputs.stdout]]\n"));
    assert!(sample.contains("\n# [[outputs.s3]]\n"));
    assert!(sample.find("OUTPUT PLUGINS").unwrap() < sample.find("INPUT PLUGINS").unwrap());
}

#[test]
fn test_sample_config_parses_into_runnable_plan() {
    let registry = registry();
    let sample = sample_config(&registry, &Filters::default()).unwrap();

    let config = Config::from_str(&sample).unwrap();
    assert_eq!(config.input_names(), vec!["grafana"]);
    assert_eq!(config.output_names(), vec!["file"]);

    let plan = Plan::build(&config, &registry, &Filters::default(), RunMode::Run).unwrap();
    assert_eq!(plan.input_names(), vec!["inputs.grafana"]);
}

#[test]
fn test_sample_config_honors_filters() {
    let filters = Filters::parse(None, Some("stdout"));
    let sample = sample_config(&registry(), &filters).unwrap();

    assert!(sample.contains("\n[[outputs.stdout]]\n"));
    assert!(!sample.contains("[[outputs.file]]"));
    assert!(sample.contains("\n[[inputs.grafana]]\n"));
}

#[test]
fn test_commented_block_has_no_trailing_spaces() {
    let mut out = String::new();
    let doc = PluginDoc {
        description: "Test plugin",
        sample: "  ## A setting\n  value = 1\n\n",
    };
    render(&mut out, "outputs", "test", &doc, true);

    assert_eq!(
        out,
        "\n# # Test plugin\n# [[outputs.test]]\n#   ## A setting\n#   value = 1\n#\n"
    );
}

#[test]
fn test_empty_sample() {
    let mut out = String::new();
    let doc = PluginDoc {
        description: "Bare",
        sample: "",
    };
    render(&mut out, "inputs", "bare", &doc, false);
    assert!(out.ends_with("[[inputs.bare]]\n  # no configuration\n"));
}

// =============================================================================
// Usage and listings
// =============================================================================

#[test]
fn test_usage() {
    let out = usage(&registry(), "file").unwrap();
    assert!(out.contains("[[outputs.file]]"));
    assert!(out.contains("output_format"));

    let out = usage(&registry(), "s3").unwrap();
    assert!(out.contains("[[outputs.s3]]"));
    assert!(out.contains("bucket"));

    let err = usage(&registry(), "influxdb").unwrap_err();
    assert!(err.to_string().contains("'influxdb'"));
}

#[test]
fn test_listings() {
    let inputs = list_inputs(&registry()).unwrap();
    assert!(inputs.starts_with("Available Input Plugins:\n"));
    assert!(inputs.contains("  grafana"));

    let outputs = list_outputs(&registry()).unwrap();
    assert!(outputs.contains("  file"));
    assert!(outputs.contains("  s3"));
    assert!(outputs.contains("  stdout"));
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_selection_defaults_first() {
    let picked = selection(&["file", "s3", "stdout"], &[], &["stdout"]);
    assert_eq!(picked, vec![("stdout", false), ("file", true), ("s3", true)]);
}

#[test]
fn test_selection_with_filter() {
    let filter = vec!["s3".to_string(), "missing".to_string()];
    let picked = selection(&["file", "s3", "stdout"], &filter, &["file"]);
    assert_eq!(picked, vec![("s3", false)]);
}
