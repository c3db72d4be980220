// src/connection/mod.rs

//! Manages the lifecycle of a single client connection: reading its request,
//! running the simulated work, and signalling completion.

mod guard;
mod handler;

pub use guard::ConnectionGuard;
pub use handler::RequestHandler;
