//! gde core types
//!
//! Everything the agent runtime and the plugins agree on:
//!
//! - [`Item`] - the immutable unit an input produces and every output receives
//! - [`Input`] / [`Output`] - the two plugin contracts
//! - [`Accumulator`] - the only channel input code uses to emit items and errors
//! - [`Registry`] - name-keyed plugin constructors, built once at startup
//!
//! # Example
//!
//! ```ignore
//! let mut registry = Registry::new();
//! gde_inputs::register(&mut registry);
//! gde_outputs::register(&mut registry);
//!
//! let factory = registry.input("grafana").expect("registered");
//! let input = factory(&settings)?;
//! ```

mod error;
mod item;
mod plugin;
mod registry;

pub use error::{PluginError, Result};
pub use item::{Action, Item, ValueKind};
pub use plugin::{Accumulator, Input, Output};
pub use registry::{InputFactory, OutputFactory, Registry};
