//! Command implementations for the gde CLI

pub mod plugins;
pub mod run;

use gde_core::Registry;

/// Registry holding every built-in plugin
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    gde_inputs::register(&mut registry);
    gde_outputs::register(&mut registry);
    registry
}
