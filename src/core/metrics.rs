// src/core/metrics.rs

//! Defines and registers Prometheus metrics for server monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use crate::core::memory::MemoryStats;
use lazy_static::lazy_static;
use prometheus::{
    Counter, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};

lazy_static! {
    // --- Request tracking ---
    /// The number of request handlers between increment and decrement.
    pub static ref ACTIVE_CONNECTIONS: Gauge =
        register_gauge!("inflight_active_connections", "Number of requests currently being handled.").unwrap();
    /// The number of spawned handler tasks that have not completed.
    pub static ref PENDING_WORK: Gauge =
        register_gauge!("inflight_pending_work", "Number of spawned handler tasks not yet finished.").unwrap();
    /// The total number of connections accepted since startup.
    pub static ref CONNECTIONS_ACCEPTED_TOTAL: Counter =
        register_counter!("inflight_connections_accepted_total", "Total number of connections accepted.").unwrap();
    /// The total number of requests that ran the full handler protocol.
    pub static ref REQUESTS_HANDLED_TOTAL: Counter =
        register_counter!("inflight_requests_handled_total", "Total number of requests handled.").unwrap();
    /// The total number of request heads answered with an error status.
    pub static ref REQUESTS_REJECTED_TOTAL: Counter =
        register_counter!("inflight_requests_rejected_total", "Total number of malformed or oversized requests rejected.").unwrap();
    /// The total number of responses that could not be written back.
    pub static ref RESPONSE_WRITE_FAILURES_TOTAL: Counter =
        register_counter!("inflight_response_write_failures_total", "Total number of failed response writes.").unwrap();

    // --- Memory ---
    pub static ref MEMORY_ALLOC_BYTES: Gauge =
        register_gauge!("inflight_memory_alloc_bytes", "Heap bytes currently allocated.").unwrap();
    pub static ref MEMORY_TOTAL_ALLOC_BYTES: Gauge =
        register_gauge!("inflight_memory_total_alloc_bytes", "Heap bytes allocated since startup.").unwrap();
    pub static ref MEMORY_SYS_BYTES: Gauge =
        register_gauge!("inflight_memory_sys_bytes", "Resident bytes of the process.").unwrap();
    pub static ref MEMORY_RECLAIM_CYCLES: Gauge =
        register_gauge!("inflight_memory_reclaim_cycles", "Heap deallocations since startup.").unwrap();

    // --- Histograms ---
    /// The simulated work duration drawn for each request.
    pub static ref REQUEST_DELAY_SECONDS: Histogram =
        register_histogram!("inflight_request_delay_seconds", "Simulated processing delay per request in seconds.").unwrap();
}

/// Publishes a memory snapshot to the memory gauges.
pub fn record_memory(stats: &MemoryStats) {
    MEMORY_ALLOC_BYTES.set(stats.alloc_bytes as f64);
    MEMORY_TOTAL_ALLOC_BYTES.set(stats.total_alloc_bytes as f64);
    MEMORY_SYS_BYTES.set(stats.sys_bytes as f64);
    MEMORY_RECLAIM_CYCLES.set(stats.reclaim_cycles as f64);
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families)
}
