//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler that turns a request into an
//! event stream. The core SSE infrastructure (Manager, Connection, codec)
//! lives in the `sse` crate.

pub mod handler;
