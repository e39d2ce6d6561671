//! gde input plugins
//!
//! | Plugin | Collects |
//! |--------|----------|
//! | `grafana` | dashboards and datasources from a Grafana server |
//!
//! Call [`register`] once at startup to make them available to the agent.

pub mod grafana;

use gde_core::Registry;

/// Register every input plugin in this crate
pub fn register(registry: &mut Registry) {
    registry.add_input(grafana::NAME, grafana::Grafana::create);
}
