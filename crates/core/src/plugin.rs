//! Plugin contracts
//!
//! Inputs produce items through an [`Accumulator`]; outputs receive every
//! item the agent accepts. Both are object-safe so the agent can hold
//! heterogeneous plugins built from configuration.

use async_trait::async_trait;

use crate::error::{PluginError, Result};
use crate::item::Item;

/// A collector invoked periodically by the agent
///
/// `process` may be called many times over the life of the instance, but
/// never concurrently with itself. Everything it produces goes through
/// the accumulator; the return value reports a failure of the invocation
/// as a whole.
#[async_trait]
pub trait Input: Send + Sync {
    /// One-line description for listings
    fn description(&self) -> &'static str;

    /// Commented TOML settings block for this plugin
    fn sample_config(&self) -> &'static str;

    /// Run one collection
    async fn process(&self, acc: &dyn Accumulator) -> Result<()>;
}

/// A writer that delivers items to an external sink
///
/// `connect` is called once before any `write`. The agent never calls
/// `write` on the same output concurrently.
#[async_trait]
pub trait Output: Send + Sync {
    /// One-line description for listings
    fn description(&self) -> &'static str;

    /// Commented TOML settings block for this plugin
    fn sample_config(&self) -> &'static str;

    /// Prepare the sink
    async fn connect(&mut self) -> Result<()>;

    /// Deliver one item
    async fn write(&self, item: &Item) -> Result<()>;
}

/// Bridge between input code and the agent's shared item channel
#[async_trait]
pub trait Accumulator: Send + Sync {
    /// Forward an item, dropping it silently if it is not deliverable
    ///
    /// May wait while the shared channel is full.
    async fn add_output(&self, item: Item);

    /// Report a non-fatal error attributed to the owning input
    fn add_error(&self, err: PluginError);

    /// Report the outcome of a sub-step; `Ok` is a no-op
    fn add_result(&self, result: Result<()>) {
        if let Err(err) = result {
            self.add_error(err);
        }
    }
}
