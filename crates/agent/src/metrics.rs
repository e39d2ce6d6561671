//! Agent metrics
//!
//! Atomic counters for one agent run. All operations use relaxed ordering;
//! values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the accumulators, gatherers and the flusher
#[derive(Debug, Default)]
pub struct AgentMetrics {
    /// Items accepted onto the shared channel
    items_accepted: AtomicU64,

    /// Items dropped (incomplete, or arriving after shutdown)
    items_dropped: AtomicU64,

    /// Errors reported by inputs through their accumulator
    input_errors: AtomicU64,

    /// Gather windows that expired while an input was still running
    timeouts: AtomicU64,

    /// Input invocations that panicked
    panics: AtomicU64,

    /// Input invocations that returned (successfully or not)
    gathers_completed: AtomicU64,

    /// Individual output writes that succeeded
    writes_succeeded: AtomicU64,

    /// Individual output writes that failed
    writes_failed: AtomicU64,
}

impl AgentMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            items_accepted: AtomicU64::new(0),
            items_dropped: AtomicU64::new(0),
            input_errors: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            panics: AtomicU64::new(0),
            gathers_completed: AtomicU64::new(0),
            writes_succeeded: AtomicU64::new(0),
            writes_failed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn item_accepted(&self) {
        self.items_accepted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn item_dropped(&self) {
        self.items_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn input_error(&self) {
        self.input_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn gather_completed(&self) {
        self.gathers_completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn write_succeeded(&self) {
        self.writes_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn write_failed(&self) {
        self.writes_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_accepted: self.items_accepted.load(Ordering::Relaxed),
            items_dropped: self.items_dropped.load(Ordering::Relaxed),
            input_errors: self.input_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            gathers_completed: self.gathers_completed.load(Ordering::Relaxed),
            writes_succeeded: self.writes_succeeded.load(Ordering::Relaxed),
            writes_failed: self.writes_failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`AgentMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub items_accepted: u64,
    pub items_dropped: u64,
    pub input_errors: u64,
    pub timeouts: u64,
    pub panics: u64,
    pub gathers_completed: u64,
    pub writes_succeeded: u64,
    pub writes_failed: u64,
}
