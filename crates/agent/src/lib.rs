//! gde agent runtime
//!
//! Runs configured inputs on their own intervals, funnels what they emit
//! through one bounded channel, and fans every item out to all outputs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  ┌──────────┐
//! │ Gatherer │  │ Gatherer │   one task per input, timeout-supervised
//! └────┬─────┘  └────┬─────┘
//!      │ Accumulator │
//!      └──────┬──────┘
//!             ▼
//!      mpsc::channel(queue_size)
//!             │
//!             ▼
//!        ┌─────────┐
//!        │ Flusher │   writes each item to every output concurrently
//!        └─────────┘
//! ```
//!
//! Shutdown is one [`CancellationToken`](tokio_util::sync::CancellationToken)
//! per run cycle. [`Lifecycle`] rebuilds the whole pipeline on reload.

mod accumulator;
mod agent;
mod control;
mod error;
mod flusher;
mod lifecycle;
mod metrics;
mod plan;
mod scheduler;

#[cfg(test)]
mod testing;

pub use accumulator::AgentAccumulator;
pub use agent::Agent;
pub use control::ControlHandle;
pub use error::{AgentError, Result};
pub use lifecycle::Lifecycle;
pub use metrics::{AgentMetrics, MetricsSnapshot};
pub use plan::{Filters, Plan, RunMode, RunningInput, RunningOutput};
