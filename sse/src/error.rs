//! Error types for the `sse` crate.
//!
//! Follows the same pattern as the other crates in the workspace: a root `Error`
//! struct holding an error kind tree and an optional source for error chaining.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the `sse` crate.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in the `sse` crate.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Connection(ConnectionErrorKind),
    Hook(HookErrorKind),
}

/// Errors from writing frames to a single connection.
#[derive(Debug, PartialEq)]
pub enum ConnectionErrorKind {
    /// The connection's disconnect signal fired before or during the write.
    Closed,
    /// The sink refused the frame because its reading half is gone.
    SinkClosed,
    /// The sink did not take the frame before the write deadline.
    TimedOut,
}

/// Errors raised by connect/reconnect hooks.
#[derive(Debug, PartialEq)]
pub enum HookErrorKind {
    /// Hook logic declined to admit the connection.
    Rejected,
}

impl Error {
    /// True when the error means the connection can no longer be written to.
    pub fn is_disconnect(&self) -> bool {
        matches!(self.error_kind, ErrorKind::Connection(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "SSE Error: {:?}: {source}", self.error_kind),
            None => write!(f, "SSE Error: {:?}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Helper function to create connection errors.
pub fn connection_error(kind: ConnectionErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Connection(kind),
    }
}

/// Helper function to create hook errors.
pub fn hook_error(kind: HookErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Hook(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = connection_error(ConnectionErrorKind::SinkClosed, "stream receiver dropped");
        let rendered = err.to_string();

        assert!(rendered.contains("SinkClosed"));
        assert!(rendered.contains("stream receiver dropped"));
    }

    #[test]
    fn test_is_disconnect_only_for_connection_errors() {
        assert!(connection_error(ConnectionErrorKind::Closed, "gone").is_disconnect());
        assert!(!hook_error(HookErrorKind::Rejected, "nope").is_disconnect());
    }
}
