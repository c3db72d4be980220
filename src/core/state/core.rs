// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use super::stats::RequestTotals;
use crate::config::Config;
use crate::core::counter::ConnectionCounter;
use crate::core::delay::SimulatedDelay;
use crate::core::tracker::CompletionTracker;
use std::sync::Arc;
use tracing::info;

/// The central struct holding all shared, server-wide state.
/// It is wrapped in an `Arc` and handed to every request handler and
/// background task.
#[derive(Debug)]
pub struct ServerState {
    /// The configuration the server was started with.
    pub config: Config,
    /// Requests currently between increment and decrement.
    pub counter: Arc<ConnectionCounter>,
    /// Spawned handler tasks that have not completed.
    pub tracker: CompletionTracker,
    /// Lifetime accepted, handled and rejected totals.
    pub totals: RequestTotals,
    /// The per-request simulated work distribution.
    pub delay: SimulatedDelay,
}

impl ServerState {
    /// Builds the shared state from a configuration.
    pub fn initialize(config: Config) -> Arc<Self> {
        let delay = SimulatedDelay::new(config.min_delay_ms, config.max_delay_ms);
        info!(
            "Simulated request work drawn uniformly from [{:?}, {:?}).",
            delay.min(),
            delay.max()
        );
        Arc::new(Self {
            config,
            counter: Arc::new(ConnectionCounter::new()),
            tracker: CompletionTracker::new(),
            totals: RequestTotals::new(),
            delay,
        })
    }
}
