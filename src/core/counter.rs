// src/core/counter.rs

//! The count of requests currently in flight.
//!
//! Every mutation happens under a mutual-exclusion lock. Response rendering
//! reads the value without that lock through [`ConnectionCounter::observe`],
//! so a rendered count is advisory and may be stale by the time it reaches
//! the client.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// A lock-guarded count of active request handlers.
#[derive(Debug, Default)]
pub struct ConnectionCounter {
    /// The authoritative count.
    count: Mutex<i64>,
    /// A copy of `count`, stored from inside the critical section and loaded
    /// without taking the lock.
    observed: AtomicI64,
}

impl ConnectionCounter {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one active handler.
    pub fn increment(&self) {
        let mut count = self.count.lock();
        *count += 1;
        self.observed.store(*count, Ordering::Relaxed);
    }

    /// Removes one active handler. Must be paired with exactly one prior `increment`.
    pub fn decrement(&self) {
        let mut count = self.count.lock();
        debug_assert!(*count > 0, "decrement without a matching increment");
        *count -= 1;
        self.observed.store(*count, Ordering::Relaxed);
    }

    /// Reads the count under the lock.
    pub fn current(&self) -> i64 {
        *self.count.lock()
    }

    /// Reads the count without synchronizing with the lock.
    ///
    /// Not linearizable: concurrent handlers may have moved the value on by
    /// the time the caller uses it.
    pub fn observe(&self) -> i64 {
        self.observed.load(Ordering::Relaxed)
    }

    /// Increments the counter and returns a guard that decrements it on drop.
    ///
    /// The guard also runs during unwinding, so a panicking handler still
    /// leaves the count balanced.
    pub fn enter(self: &Arc<Self>) -> ActiveGuard {
        self.increment();
        ActiveGuard {
            counter: Arc::clone(self),
        }
    }
}

/// An RAII registration with a [`ConnectionCounter`].
#[must_use = "dropping the guard immediately decrements the counter"]
#[derive(Debug)]
pub struct ActiveGuard {
    counter: Arc<ConnectionCounter>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.counter.decrement();
    }
}
