//! Agent - one run cycle of the collection pipeline
//!
//! Owns the plan's plugin instances. `connect` prepares every output,
//! `run` drives the gatherers and the flusher until the cycle's
//! cancellation token fires, and `test` runs every input once without
//! touching the outputs.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::future::join_all;
use gde_config::AgentConfig;
use gde_core::Item;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::accumulator::AgentAccumulator;
use crate::error::{AgentError, Result};
use crate::flusher::Flusher;
use crate::metrics::{AgentMetrics, MetricsSnapshot};
use crate::plan::{Plan, RunningInput, RunningOutput};
use crate::scheduler::{Gatherer, panic_message};

/// The collection pipeline for one run cycle
pub struct Agent {
    config: AgentConfig,
    inputs: Vec<RunningInput>,
    outputs: Vec<RunningOutput>,
    metrics: Arc<AgentMetrics>,
}

impl Agent {
    /// Create an agent from a validated plan
    pub fn new(plan: Plan) -> Self {
        Self {
            config: plan.agent,
            inputs: plan.inputs,
            outputs: plan.outputs,
            metrics: Arc::new(AgentMetrics::new()),
        }
    }

    /// Metrics for this agent; valid after `run` consumes it
    pub fn metrics(&self) -> Arc<AgentMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Connect every output, failing on the first error
    pub async fn connect(&mut self) -> Result<()> {
        for output in &mut self.outputs {
            debug!(output = %output.name, "connecting output");
            output
                .output
                .connect()
                .await
                .map_err(|source| AgentError::Connect {
                    output: output.name.clone(),
                    source,
                })?;
            info!(output = %output.name, "output connected");
        }
        Ok(())
    }

    /// Run every input once, in order, discarding what they emit
    ///
    /// The first input error or panic is returned. Outputs are not touched.
    pub async fn test(&self) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<Item>(self.config.queue_size);
        let cancel = CancellationToken::new();

        let discard = tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                info!(item = %item, "collected");
            }
        });

        for input in &self.inputs {
            info!(input = %input.name, "collecting once");

            let acc = AgentAccumulator::new(
                Arc::clone(&input.name),
                tx.clone(),
                cancel.clone(),
                Arc::clone(&self.metrics),
            );
            let plugin = Arc::clone(&input.input);
            let span = info_span!("gather", input = %input.name);

            let joined = tokio::spawn(async move { plugin.process(&acc).await }.instrument(span)).await;
            match joined {
                Ok(Ok(())) => self.metrics.gather_completed(),
                Ok(Err(source)) => {
                    return Err(AgentError::Input {
                        input: input.name.to_string(),
                        source,
                    });
                }
                Err(e) => {
                    let message = if e.is_panic() {
                        panic_message(e.into_panic())
                    } else {
                        e.to_string()
                    };
                    return Err(AgentError::InputPanicked {
                        input: input.name.to_string(),
                        message,
                    });
                }
            }
        }

        drop(tx);
        report_join("collected item logger", discard.await);
        Ok(())
    }

    /// Run until `cancel` fires
    ///
    /// Outputs must be connected first. Returns the final metrics.
    pub async fn run(self, cancel: CancellationToken) -> MetricsSnapshot {
        let Agent {
            config,
            inputs,
            outputs,
            metrics,
        } = self;

        info!(
            inputs = ?inputs.iter().map(|i| &*i.name).collect::<Vec<_>>(),
            outputs = ?outputs.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(),
            interval = ?config.interval,
            "agent starting"
        );

        let (tx, rx) = mpsc::channel(config.queue_size);
        let flusher = tokio::spawn(
            Flusher::new(outputs, rx, cancel.clone(), Arc::clone(&metrics)).run(),
        );

        let mut workers = Vec::with_capacity(inputs.len() + 1);
        if config.round_interval {
            let wait = until_next_boundary(config.interval, SystemTime::now());
            debug!(wait = ?wait, "aligning first collection to interval");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(wait) => {}
            }
        }

        if !cancel.is_cancelled() {
            for input in &inputs {
                let gatherer = Gatherer::new(
                    input,
                    config.interval,
                    tx.clone(),
                    cancel.clone(),
                    Arc::clone(&metrics),
                );
                workers.push(gatherer.spawn());
            }
        }
        drop(tx);
        workers.push(flusher);

        cancel.cancelled().await;
        info!("agent shutting down");

        match tokio::time::timeout(config.shutdown_timeout, join_all(workers)).await {
            Ok(results) => {
                for result in results {
                    report_join("worker", result);
                }
            }
            Err(_) => warn!(
                timeout = ?config.shutdown_timeout,
                "workers did not stop in time, abandoning them"
            ),
        }

        let snapshot = metrics.snapshot();
        info!(
            items_accepted = snapshot.items_accepted,
            items_dropped = snapshot.items_dropped,
            input_errors = snapshot.input_errors,
            timeouts = snapshot.timeouts,
            panics = snapshot.panics,
            writes_succeeded = snapshot.writes_succeeded,
            writes_failed = snapshot.writes_failed,
            "agent stopped"
        );
        snapshot
    }
}

/// Log a background task that panicked or was aborted
pub(crate) fn report_join(task: &str, result: std::result::Result<(), JoinError>) {
    if let Err(e) = result {
        warn!(task, error = %e, "task ended abnormally");
    }
}

/// Time from `now` to the next multiple of `interval` since the epoch
pub(crate) fn until_next_boundary(interval: Duration, now: SystemTime) -> Duration {
    let interval_ns = interval.as_nanos();
    if interval_ns == 0 {
        return Duration::ZERO;
    }
    let now_ns = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let wait = interval_ns - now_ns % interval_ns;
    Duration::from_nanos(u64::try_from(wait).unwrap_or(u64::MAX))
}

#[cfg(test)]
#[path = "agent_test.rs"]
mod agent_test;
