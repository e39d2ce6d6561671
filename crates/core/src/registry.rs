//! Plugin registry
//!
//! Maps plugin type names to constructors. Each plugin crate exposes a
//! `register(&mut Registry)` function; the binary calls them once at
//! startup and then only reads from the registry.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::plugin::{Input, Output};

/// Constructor for an input from its settings table
///
/// An empty table must yield the plugin's defaults.
pub type InputFactory = fn(&toml::Table) -> Result<Box<dyn Input>>;

/// Constructor for an output from its settings table
///
/// An empty table must yield the plugin's defaults.
pub type OutputFactory = fn(&toml::Table) -> Result<Box<dyn Output>>;

/// Name-keyed plugin constructors
#[derive(Default, Clone)]
pub struct Registry {
    inputs: BTreeMap<&'static str, InputFactory>,
    outputs: BTreeMap<&'static str, OutputFactory>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input constructor, replacing any previous one
    pub fn add_input(&mut self, name: &'static str, factory: InputFactory) {
        debug!(input = name, "registered input plugin");
        self.inputs.insert(name, factory);
    }

    /// Register an output constructor, replacing any previous one
    pub fn add_output(&mut self, name: &'static str, factory: OutputFactory) {
        debug!(output = name, "registered output plugin");
        self.outputs.insert(name, factory);
    }

    /// Look up an input constructor
    pub fn input(&self, name: &str) -> Option<InputFactory> {
        self.inputs.get(name).copied()
    }

    /// Look up an output constructor
    pub fn output(&self, name: &str) -> Option<OutputFactory> {
        self.outputs.get(name).copied()
    }

    /// Registered input names, sorted
    pub fn input_names(&self) -> Vec<&'static str> {
        self.inputs.keys().copied().collect()
    }

    /// Registered output names, sorted
    pub fn output_names(&self) -> Vec<&'static str> {
        self.outputs.keys().copied().collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("inputs", &self.input_names())
            .field("outputs", &self.output_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::plugin::Accumulator;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl Input for Noop {
        fn description(&self) -> &'static str {
            "does nothing"
        }

        fn sample_config(&self) -> &'static str {
            ""
        }

        async fn process(&self, _acc: &dyn Accumulator) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl Output for Noop {
        fn description(&self) -> &'static str {
            "discards everything"
        }

        fn sample_config(&self) -> &'static str {
            ""
        }

        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        async fn write(&self, _item: &Item) -> Result<()> {
            Ok(())
        }
    }

    fn noop_input(_: &toml::Table) -> Result<Box<dyn Input>> {
        Ok(Box::new(Noop))
    }

    fn noop_output(_: &toml::Table) -> Result<Box<dyn Output>> {
        Ok(Box::new(Noop))
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = Registry::new();
        registry.add_input("zeta", noop_input);
        registry.add_input("alpha", noop_input);
        registry.add_output("null", noop_output);

        assert_eq!(registry.input_names(), vec!["alpha", "zeta"]);
        assert_eq!(registry.output_names(), vec!["null"]);
    }

    #[test]
    fn test_create_known_plugin() {
        let mut registry = Registry::new();
        registry.add_input("noop", noop_input);

        let factory = registry.input("noop").unwrap();
        let input = factory(&toml::Table::new()).unwrap();
        assert_eq!(input.description(), "does nothing");
    }

    #[test]
    fn test_lookup_unknown_plugin() {
        let mut registry = Registry::new();
        registry.add_input("noop", noop_input);

        assert!(registry.output("noop").is_none());
        assert!(registry.input("grafana").is_none());
    }
}
