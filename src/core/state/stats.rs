// src/core/state/stats.rs

//! Lifetime request totals, kept apart from the in-flight count.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic totals updated by the accept loop and the request handlers.
///
/// Every accepted connection ends up in at most one of `handled` or
/// `rejected`. Connections that close or are shut down before a request head
/// arrives are in neither.
#[derive(Debug, Default)]
pub struct RequestTotals {
    accepted: AtomicU64,
    handled: AtomicU64,
    rejected: AtomicU64,
}

/// A point-in-time copy of [`RequestTotals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TotalsSnapshot {
    pub accepted: u64,
    pub handled: u64,
    pub rejected: u64,
}

impl RequestTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a request that went through increment, delay, response and decrement,
    /// whether or not the response reached the client.
    pub fn record_handled(&self) {
        self.handled.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a request head that was answered with an error status.
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> TotalsSnapshot {
        TotalsSnapshot {
            accepted: self.accepted(),
            handled: self.handled(),
            rejected: self.rejected(),
        }
    }
}

impl fmt::Display for TotalsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} connection(s) accepted, {} request(s) handled, {} rejected",
            self.accepted, self.handled, self.rejected
        )
    }
}
