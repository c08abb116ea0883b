//! This module holds typed parameters for endpoint inputs.
//!
//! Request bodies are deserialized straight into these structs, so a malformed
//! body is rejected by the `Json` extractor before any handler logic runs.

pub(crate) mod reconnect_interval;
