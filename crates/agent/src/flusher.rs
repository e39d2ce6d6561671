//! Fan-out worker
//!
//! Reads items from the shared channel and writes each one to every output
//! concurrently, waiting for all writes before taking the next item. A
//! failing output is logged and does not affect the others.

use std::sync::Arc;

use futures::future::join_all;
use gde_core::Item;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::metrics::AgentMetrics;
use crate::plan::RunningOutput;

/// Single consumer of the item channel
pub(crate) struct Flusher {
    outputs: Vec<RunningOutput>,
    receiver: mpsc::Receiver<Item>,
    cancel: CancellationToken,
    metrics: Arc<AgentMetrics>,
}

impl Flusher {
    pub(crate) fn new(
        outputs: Vec<RunningOutput>,
        receiver: mpsc::Receiver<Item>,
        cancel: CancellationToken,
        metrics: Arc<AgentMetrics>,
    ) -> Self {
        Self {
            outputs,
            receiver,
            cancel,
            metrics,
        }
    }

    /// Deliver items until shutdown, then flush what is already queued
    pub(crate) async fn run(mut self) {
        info!(outputs = self.outputs.len(), "flusher started");

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                item = self.receiver.recv() => match item {
                    Some(item) => self.flush(&item).await,
                    None => break,
                },
            }
        }

        self.receiver.close();
        let mut drained = 0usize;
        while let Ok(item) = self.receiver.try_recv() {
            self.flush(&item).await;
            drained += 1;
        }

        info!(drained, "flusher stopped");
    }

    /// Write one item to every output
    async fn flush(&self, item: &Item) {
        debug!(item = %item, "flushing item");

        let writes = self
            .outputs
            .iter()
            .map(|o| async move { (o.name.as_str(), o.output.write(item).await) });

        for (name, result) in join_all(writes).await {
            match result {
                Ok(()) => self.metrics.write_succeeded(),
                Err(e) => {
                    self.metrics.write_failed();
                    error!(output = %name, error = %e, "error writing to output");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "flusher_test.rs"]
mod flusher_test;
