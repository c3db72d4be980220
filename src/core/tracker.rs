// src/core/tracker.rs

//! A counting wait barrier for spawned request handlers.

use std::sync::Arc;
use tokio::sync::watch;

/// Tracks how many spawned handler tasks have not finished yet.
///
/// The pending count lives in a `watch` channel so that `wait_idle` can
/// suspend until it reaches zero without polling.
#[derive(Debug, Clone)]
pub struct CompletionTracker {
    pending: Arc<watch::Sender<usize>>,
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionTracker {
    /// Creates a tracker with no pending work.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0usize);
        Self {
            pending: Arc::new(tx),
        }
    }

    /// Registers one unit of pending work.
    ///
    /// Call this before spawning the task that owns the returned permit, so
    /// the work is visible to `wait_idle` before the task starts.
    pub fn register(&self) -> WorkPermit {
        self.pending.send_modify(|n| *n += 1);
        WorkPermit {
            pending: Arc::clone(&self.pending),
        }
    }

    /// The number of registered units that have not completed.
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Suspends until no work is pending. Returns immediately if nothing is.
    pub async fn wait_idle(&self) {
        let mut rx = self.pending.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

/// Proof of one registered unit of work. Dropping it marks the unit done.
#[must_use = "dropping the permit immediately marks the work as finished"]
#[derive(Debug)]
pub struct WorkPermit {
    pending: Arc<watch::Sender<usize>>,
}

impl Drop for WorkPermit {
    fn drop(&mut self) {
        self.pending.send_modify(|n| {
            debug_assert!(*n > 0, "completion signalled without registration");
            *n = n.saturating_sub(1);
        });
    }
}
