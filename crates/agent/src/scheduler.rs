//! Per-input gatherer
//!
//! Each configured input gets its own task that fires once immediately and
//! then once per interval. Every firing runs the input in a separate task
//! so a panic stays contained, and supervises it with a repeating timer:
//! while the call is outstanding each timer period reports a timeout error
//! and no new invocation starts. The in-flight call is never cancelled.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gde_core::{Accumulator, Input, Item, PluginError};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::accumulator::AgentAccumulator;
use crate::metrics::AgentMetrics;
use crate::plan::RunningInput;

/// Periodic worker for one input
pub(crate) struct Gatherer {
    name: Arc<str>,
    input: Arc<dyn Input>,
    interval: Duration,
    timeout: Duration,
    accumulator: AgentAccumulator,
    cancel: CancellationToken,
    metrics: Arc<AgentMetrics>,
}

impl Gatherer {
    /// Create a gatherer; `default_interval` applies when the input has none
    pub(crate) fn new(
        input: &RunningInput,
        default_interval: Duration,
        sender: mpsc::Sender<Item>,
        cancel: CancellationToken,
        metrics: Arc<AgentMetrics>,
    ) -> Self {
        let interval = input.interval.unwrap_or(default_interval);
        let timeout = input.timeout.unwrap_or(interval);
        let accumulator = AgentAccumulator::new(
            Arc::clone(&input.name),
            sender,
            cancel.clone(),
            Arc::clone(&metrics),
        );

        Self {
            name: Arc::clone(&input.name),
            input: Arc::clone(&input.input),
            interval,
            timeout,
            accumulator,
            cancel,
            metrics,
        }
    }

    /// Spawn the gatherer loop
    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Collect on every tick until cancelled
    pub(crate) async fn run(self) {
        info!(
            input = %self.name,
            interval = ?self.interval,
            timeout = ?self.timeout,
            "starting input"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            self.gather_with_timeout().await;

            if self.cancel.is_cancelled() {
                break;
            }
        }

        debug!(input = %self.name, "input stopped");
    }

    /// Run one collection under timeout supervision
    async fn gather_with_timeout(&self) {
        let started = Instant::now();
        let mut task = self.spawn_process();
        let mut timer = time::interval_at(time::Instant::now() + self.timeout, self.timeout);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    if !task.is_finished() {
                        debug!(input = %self.name, "shutdown during collection, leaving it to finish in background");
                    }
                    return;
                }

                joined = &mut task => {
                    self.complete(joined, started);
                    return;
                }

                _ = timer.tick() => {
                    self.metrics.timeout();
                    self.accumulator.add_error(PluginError::Timeout(self.timeout));
                }
            }
        }
    }

    fn spawn_process(&self) -> JoinHandle<gde_core::Result<()>> {
        let input = Arc::clone(&self.input);
        let acc = self.accumulator.clone();
        let span = info_span!("gather", input = %self.name);

        tokio::spawn(async move { input.process(&acc).await }.instrument(span))
    }

    fn complete(&self, joined: Result<gde_core::Result<()>, JoinError>, started: Instant) {
        match joined {
            Ok(result) => {
                self.metrics.gather_completed();
                debug!(input = %self.name, elapsed = ?started.elapsed(), "collection finished");
                self.accumulator.add_result(result);
            }
            Err(e) if e.is_panic() => {
                self.metrics.panic();
                error!(
                    input = %self.name,
                    panic = %panic_message(e.into_panic()),
                    "input panicked, continuing on next interval"
                );
            }
            Err(e) => {
                warn!(input = %self.name, error = %e, "collection task cancelled");
            }
        }
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "<non-string panic payload>".to_string()
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;
