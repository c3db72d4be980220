// src/core/protocol/mod.rs

pub mod http;

pub use http::{HttpCodec, MAX_HEAD_SIZE, RequestHead, Response};
