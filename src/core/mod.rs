// src/core/mod.rs

//! The central module containing the core logic and data structures of the
//! request-tracking service.

pub mod counter;
pub mod delay;
pub mod errors;
pub mod memory;
pub mod metrics;
pub mod protocol;
pub mod state;
pub mod tasks;
pub mod tracker;

pub use counter::{ActiveGuard, ConnectionCounter};
pub use errors::InflightError;
pub use tracker::{CompletionTracker, WorkPermit};
