//! Process-wide request gate.
//!
//! The style file is a single shared resource, so only one generation may
//! run at a time. Acquiring the gate waits (it never fails fast) and the
//! returned [`GatePermit`] releases it when dropped, on every exit path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Binary gate serializing generations. Cloning shares the same gate.
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    lock: Arc<Mutex<()>>,
    waiting: Arc<AtomicUsize>,
}

/// Exclusive right to touch the style file. Released on drop.
#[derive(Debug)]
pub struct GatePermit {
    _guard: OwnedMutexGuard<()>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other generation holds the gate.
    ///
    /// Waiters are served in arrival order.
    pub async fn acquire(&self) -> GatePermit {
        let queued = self.waiting.fetch_add(1, Ordering::SeqCst);
        if queued > 0 {
            debug!(queued, "Waiting for running generation");
        }
        // Decrements on completion and on cancellation alike
        let _waiting = WaitingGuard(&self.waiting);
        let guard = Arc::clone(&self.lock).lock_owned().await;
        GatePermit { _guard: guard }
    }

    /// Acquires the gate only if it is free.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        Arc::clone(&self.lock)
            .try_lock_owned()
            .ok()
            .map(|guard| GatePermit { _guard: guard })
    }

    /// Number of callers currently waiting in [`acquire`](Self::acquire).
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

struct WaitingGuard<'a>(&'a AtomicUsize);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
