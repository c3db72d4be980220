// src/core/tasks/mod.rs

//! Long-running background tasks that run beside the request handlers.

pub mod memory_sampler;
