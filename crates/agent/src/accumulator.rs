//! Accumulator bound to one input
//!
//! Forwards deliverable items onto the shared channel and turns errors into
//! log entries tagged with the input's qualified name. Once the cycle is
//! cancelled nothing more is accepted.

use std::sync::Arc;

use async_trait::async_trait;
use gde_core::{Accumulator, Item, PluginError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::metrics::AgentMetrics;

/// Accumulator handed to each input invocation
#[derive(Clone)]
pub struct AgentAccumulator {
    input: Arc<str>,
    sender: mpsc::Sender<Item>,
    cancel: CancellationToken,
    metrics: Arc<AgentMetrics>,
}

impl AgentAccumulator {
    /// Create an accumulator for `input`
    pub fn new(
        input: Arc<str>,
        sender: mpsc::Sender<Item>,
        cancel: CancellationToken,
        metrics: Arc<AgentMetrics>,
    ) -> Self {
        Self {
            input,
            sender,
            cancel,
            metrics,
        }
    }

    /// Qualified name of the owning input
    pub fn input(&self) -> &str {
        &self.input
    }
}

#[async_trait]
impl Accumulator for AgentAccumulator {
    async fn add_output(&self, item: Item) {
        if !item.is_deliverable() {
            self.metrics.item_dropped();
            debug!(input = %self.input, item = %item, "dropping incomplete item");
            return;
        }

        if self.cancel.is_cancelled() {
            self.metrics.item_dropped();
            return;
        }

        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => {
                self.metrics.item_dropped();
            }

            sent = self.sender.send(item) => match sent {
                Ok(()) => self.metrics.item_accepted(),
                Err(_) => {
                    self.metrics.item_dropped();
                    debug!(input = %self.input, "item channel closed, dropping item");
                }
            },
        }
    }

    fn add_error(&self, err: PluginError) {
        self.metrics.input_error();
        match err {
            PluginError::Timeout(_) => warn!(input = %self.input, error = %err, "error in plugin"),
            _ => error!(input = %self.input, error = %err, "error in plugin"),
        }
    }
}

#[cfg(test)]
#[path = "accumulator_test.rs"]
mod accumulator_test;
