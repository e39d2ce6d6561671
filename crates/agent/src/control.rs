//! Shutdown and reload requests
//!
//! A [`ControlHandle`] is shared between the signal watcher and the
//! lifecycle loop. Each run cycle gets a fresh cancellation token; a
//! shutdown or reload request cancels the current one. At most one reload
//! is pending at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct ControlState {
    current: Mutex<CancellationToken>,
    reload_pending: AtomicBool,
    terminated: AtomicBool,
}

/// Cloneable handle for requesting shutdown or reload
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    state: Arc<ControlState>,
}

impl ControlHandle {
    /// Create a handle with no cycle running
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the current cycle and do not start another
    pub fn request_shutdown(&self) {
        info!("shutdown requested");
        self.state.terminated.store(true, Ordering::SeqCst);
        self.state.current.lock().cancel();
    }

    /// Stop the current cycle and start a new one from fresh config
    ///
    /// Returns `false` if a reload was already pending.
    pub fn request_reload(&self) -> bool {
        if self.state.reload_pending.swap(true, Ordering::SeqCst) {
            debug!("reload already pending");
            return false;
        }
        info!("reload requested");
        self.state.current.lock().cancel();
        true
    }

    /// Whether shutdown was requested
    pub fn is_terminated(&self) -> bool {
        self.state.terminated.load(Ordering::SeqCst)
    }

    /// Whether a reload is waiting to be taken
    pub fn is_reload_pending(&self) -> bool {
        self.state.reload_pending.load(Ordering::SeqCst)
    }

    /// Token for a new cycle; already cancelled if a request is outstanding
    pub fn begin_cycle(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut current = self.state.current.lock();
        if self.is_terminated() || self.is_reload_pending() {
            token.cancel();
        }
        *current = token.clone();
        token
    }

    /// Consume a pending reload
    pub fn take_reload(&self) -> bool {
        self.state.reload_pending.swap(false, Ordering::SeqCst)
    }
}
