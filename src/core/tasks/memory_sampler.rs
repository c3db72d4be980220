// src/core/tasks/memory_sampler.rs

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::info;

use crate::core::InflightError;
use crate::core::memory::{MemoryProbe, MemoryStats};
use crate::core::metrics;

/// A task that periodically logs process memory statistics.
///
/// It shares nothing with the request handlers and stops only when the
/// shutdown broadcast fires.
pub struct MemorySamplerTask {
    probe: Arc<Mutex<MemoryProbe>>,
    interval: Duration,
}

impl MemorySamplerTask {
    pub fn new(interval: Duration) -> Result<Self, InflightError> {
        Ok(Self {
            probe: Arc::new(Mutex::new(MemoryProbe::new()?)),
            interval,
        })
    }

    /// Takes, publishes and logs a single sample.
    ///
    /// Reading process memory touches the filesystem, so the probe runs on
    /// the blocking pool.
    pub async fn tick(&mut self) -> Result<MemoryStats, InflightError> {
        let probe = self.probe.clone();
        let stats = tokio::task::spawn_blocking(move || probe.lock().sample())
            .await
            .map_err(|e| InflightError::MemorySample(format!("sampling thread failed: {e}")))??;
        metrics::record_memory(&stats);
        info!("{}", stats);
        Ok(stats)
    }

    /// Samples, then sleeps for the interval, until shutdown.
    ///
    /// A sampling failure ends the task with an error, which the server
    /// treats as fatal.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<(), InflightError> {
        info!("Memory sampler started. Interval: {:?}.", self.interval);
        loop {
            self.tick().await?;
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown_rx.recv() => {
                    info!("Memory sampler shutting down.");
                    return Ok(());
                }
            }
        }
    }
}
