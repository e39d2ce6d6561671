//! Run/reload loop
//!
//! Each cycle builds a connected [`Agent`] through the caller's `start`
//! function (parse config, build plan, connect outputs) and runs it until
//! its token is cancelled. A pending reload starts another cycle;
//! anything else ends the loop.

use std::future::Future;

use tracing::info;

use crate::agent::Agent;
use crate::control::ControlHandle;
use crate::error::Result;
use crate::metrics::MetricsSnapshot;

/// Drives run cycles until shutdown
pub struct Lifecycle {
    control: ControlHandle,
}

impl Lifecycle {
    /// Create a lifecycle driven by `control`
    pub fn new(control: ControlHandle) -> Self {
        Self { control }
    }

    /// The handle used to request shutdown or reload
    pub fn control(&self) -> &ControlHandle {
        &self.control
    }

    /// Run cycles until shutdown or a cycle ends without a reload
    ///
    /// Errors from `start` end the loop; returns the last cycle's metrics.
    pub async fn run<F, Fut>(&self, mut start: F) -> Result<MetricsSnapshot>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Agent>>,
    {
        let mut cycle = 0u64;
        let mut last = MetricsSnapshot::default();

        loop {
            let token = self.control.begin_cycle();
            if self.control.is_terminated() {
                return Ok(last);
            }

            cycle += 1;
            let agent = start().await?;
            info!(cycle, "run cycle started");
            last = agent.run(token).await;

            if self.control.is_terminated() || !self.control.take_reload() {
                return Ok(last);
            }
            info!(cycle, "reloading config");
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod lifecycle_test;
