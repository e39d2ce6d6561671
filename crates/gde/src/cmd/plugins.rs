//! Plugin documentation commands: `config`, `usage`, `inputs`, `outputs`

use std::fmt::Write;

use anyhow::{Context, Result, bail};
use gde_agent::Filters;
use gde_core::Registry;

/// Plugins printed uncommented when no filter is given
const DEFAULT_INPUTS: &[&str] = &["grafana"];
const DEFAULT_OUTPUTS: &[&str] = &["file"];

const HEADER: &str = r#"# gde configuration
#
# gde is entirely plugin driven. Every document is gathered from the
# declared inputs and sent to the declared outputs.
#
# Use 'gde --config gde.conf --test' to see what a config file would collect.
#
# Environment variables can be used anywhere in this file by prefixing them
# with $. Strings must keep their quotes ("$STR_VAR"); numbers and booleans
# go bare ($INT_VAR, $BOOL_VAR).

# Agent settings
[agent]
  ## Default collection interval for all inputs
  interval = "10s"
  ## Align collection to multiples of 'interval'
  ## ie, with interval = "10s" collect at :00, :10, :20, etc.
  round_interval = true

  ## Capacity of the queue between inputs and outputs
  queue_size = 100
  ## How long to wait for in-flight work on shutdown or reload
  shutdown_timeout = "5s"

  ## Log debug messages
  debug = false
  ## Log errors only
  quiet = false
  ## Log file; the empty string means stderr
  logfile = ""
  ## "console" or "json"
  log_format = "console"


###############################################################################
#                            OUTPUT PLUGINS                                   #
###############################################################################
"#;

const INPUTS_HEADER: &str = r#"

###############################################################################
#                            INPUT PLUGINS                                    #
###############################################################################
"#;

/// What a plugin says about itself
struct PluginDoc {
    description: &'static str,
    sample: &'static str,
}

fn input_doc(registry: &Registry, name: &str) -> Result<Option<PluginDoc>> {
    let Some(factory) = registry.input(name) else {
        return Ok(None);
    };
    let input = factory(&toml::Table::new()).with_context(|| format!("input {}", name))?;
    Ok(Some(PluginDoc {
        description: input.description(),
        sample: input.sample_config(),
    }))
}

fn output_doc(registry: &Registry, name: &str) -> Result<Option<PluginDoc>> {
    let Some(factory) = registry.output(name) else {
        return Ok(None);
    };
    let output = factory(&toml::Table::new()).with_context(|| format!("output {}", name))?;
    Ok(Some(PluginDoc {
        description: output.description(),
        sample: output.sample_config(),
    }))
}

/// Append one `[[section.name]]` block, optionally commented out
fn render(out: &mut String, section: &str, name: &str, doc: &PluginDoc, commented: bool) {
    let c = if commented { "# " } else { "" };
    let _ = write!(out, "\n{c}# {}\n{c}[[{}.{}]]\n", doc.description, section, name);

    if doc.sample.trim().is_empty() {
        let _ = writeln!(out, "{c}  # no configuration");
        return;
    }
    for line in doc.sample.lines() {
        let _ = writeln!(out, "{}", format!("{c}{line}").trim_end());
    }
}

/// Which plugins to print, and whether commented
///
/// With a filter: only the filtered plugins, uncommented. Without: the
/// defaults uncommented, then everything else commented.
fn selection(available: &[&'static str], filter: &[String], defaults: &[&str]) -> Vec<(&'static str, bool)> {
    if !filter.is_empty() {
        return available
            .iter()
            .filter(|name| filter.iter().any(|f| f == **name))
            .map(|name| (*name, false))
            .collect();
    }

    let (enabled, rest): (Vec<&'static str>, Vec<&'static str>) = available
        .iter()
        .copied()
        .partition(|name| defaults.contains(name));
    enabled
        .into_iter()
        .map(|name| (name, false))
        .chain(rest.into_iter().map(|name| (name, true)))
        .collect()
}

/// Full sample configuration
pub fn sample_config(registry: &Registry, filters: &Filters) -> Result<String> {
    let mut out = String::from(HEADER);

    for (name, commented) in selection(&registry.output_names(), &filters.outputs, DEFAULT_OUTPUTS) {
        if let Some(doc) = output_doc(registry, name)? {
            render(&mut out, "outputs", name, &doc, commented);
        }
    }

    out.push_str(INPUTS_HEADER);
    for (name, commented) in selection(&registry.input_names(), &filters.inputs, DEFAULT_INPUTS) {
        if let Some(doc) = input_doc(registry, name)? {
            render(&mut out, "inputs", name, &doc, commented);
        }
    }

    Ok(out)
}

/// Sample settings of one plugin; a name shared by an input and an output
/// prints both
pub fn usage(registry: &Registry, name: &str) -> Result<String> {
    let mut out = String::new();
    if let Some(doc) = input_doc(registry, name)? {
        render(&mut out, "inputs", name, &doc, false);
    }
    if let Some(doc) = output_doc(registry, name)? {
        render(&mut out, "outputs", name, &doc, false);
    }
    if out.is_empty() {
        bail!("no input or output plugin named '{}'", name);
    }
    Ok(out)
}

/// `Available Input Plugins:` listing
pub fn list_inputs(registry: &Registry) -> Result<String> {
    let mut out = String::from("Available Input Plugins:\n");
    for name in registry.input_names() {
        if let Some(doc) = input_doc(registry, name)? {
            let _ = writeln!(out, "  {:<10} {}", name, doc.description);
        }
    }
    Ok(out)
}

/// `Available Output Plugins:` listing
pub fn list_outputs(registry: &Registry) -> Result<String> {
    let mut out = String::from("Available Output Plugins:\n");
    for name in registry.output_names() {
        if let Some(doc) = output_doc(registry, name)? {
            let _ = writeln!(out, "  {:<10} {}", name, doc.description);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "plugins_test.rs"]
mod plugins_test;
