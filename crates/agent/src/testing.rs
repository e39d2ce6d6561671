//! Test doubles shared by the agent's unit tests

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gde_core::{Accumulator, Input, Item, Output, PluginError, Result, ValueKind};
use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

// =============================================================================
// Log capture
// =============================================================================

#[derive(Debug, Clone)]
pub(crate) struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Clone, Default)]
pub(crate) struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    /// Route events on this thread into the capture until the guard drops
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    /// Events at `level` whose `key` field equals `value`
    pub fn count(&self, level: Level, key: &str, value: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.level == level && e.fields.get(key).is_some_and(|v| v == value))
            .count()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let message = visitor.fields.remove("message").unwrap_or_default();
        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), format!("{:?}", value));
    }
}

// =============================================================================
// Inputs
// =============================================================================

pub(crate) fn dashboard(title: &str) -> Item {
    Item::create("Main@now", ValueKind::Dashboard, title, format!("{{\"title\":\"{title}\"}}"))
}

/// Emits a fixed list of items, then returns `error` if set
#[derive(Default)]
pub(crate) struct ScriptedInput {
    pub items: Vec<Item>,
    pub error: Option<String>,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedInput {
    pub fn emitting(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Input for ScriptedInput {
    fn description(&self) -> &'static str {
        "scripted"
    }

    fn sample_config(&self) -> &'static str {
        ""
    }

    async fn process(&self, acc: &dyn Accumulator) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for item in &self.items {
            acc.add_output(item.clone()).await;
        }
        match &self.error {
            Some(message) => Err(PluginError::other(message.clone())),
            None => Ok(()),
        }
    }
}

/// Sleeps on every call and tracks how many calls overlap
pub(crate) struct SlowInput {
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl SlowInput {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: Arc::default(),
            in_flight: Arc::default(),
            max_in_flight: Arc::default(),
        }
    }
}

#[async_trait]
impl Input for SlowInput {
    fn description(&self) -> &'static str {
        "slow"
    }

    fn sample_config(&self) -> &'static str {
        ""
    }

    async fn process(&self, _acc: &dyn Accumulator) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Panics on its first call, succeeds afterwards
#[derive(Default)]
pub(crate) struct PanicOnceInput {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Input for PanicOnceInput {
    fn description(&self) -> &'static str {
        "panics once"
    }

    fn sample_config(&self) -> &'static str {
        ""
    }

    async fn process(&self, _acc: &dyn Accumulator) -> Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first collection blew up");
        }
        Ok(())
    }
}

// =============================================================================
// Outputs
// =============================================================================

/// Records every item; optionally fails connect or every write
#[derive(Default, Clone)]
pub(crate) struct RecordingOutput {
    pub received: Arc<Mutex<Vec<Item>>>,
    pub writes: Arc<AtomicUsize>,
    pub connected: Arc<AtomicBool>,
    pub fail_connect: bool,
    pub fail_write: bool,
}

impl RecordingOutput {
    pub fn failing_writes() -> Self {
        Self {
            fail_write: true,
            ..Default::default()
        }
    }

    pub fn failing_connect() -> Self {
        Self {
            fail_connect: true,
            ..Default::default()
        }
    }

    pub fn titles(&self) -> Vec<String> {
        self.received.lock().iter().map(|i| i.title.clone()).collect()
    }
}

#[async_trait]
impl Output for RecordingOutput {
    fn description(&self) -> &'static str {
        "records items"
    }

    fn sample_config(&self) -> &'static str {
        ""
    }

    async fn connect(&mut self) -> Result<()> {
        if self.fail_connect {
            return Err(PluginError::Connect("sink unreachable".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn write(&self, item: &Item) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_write {
            return Err(PluginError::write("sink rejected item"));
        }
        self.received.lock().push(item.clone());
        Ok(())
    }
}
