use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use sse::error::{Error as SseError, ErrorKind as SseErrorKind};

pub type Result<T> = core::result::Result<T, Error>;

/// Web layer error. Carries the kind that decides the HTTP status and, when the
/// error was translated from the `sse` crate, the original error as `source`.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: WebErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum WebErrorKind {
    /// The request did not ask for `text/event-stream`.
    NotAcceptable,
    /// No live client matches the requested connection or user id.
    ClientNotFound,
    /// The client went away while we were writing to it.
    ClientGone,
    Internal,
}

impl Error {
    pub fn not_acceptable() -> Self {
        Self {
            source: None,
            error_kind: WebErrorKind::NotAcceptable,
        }
    }

    pub fn client_not_found() -> Self {
        Self {
            source: None,
            error_kind: WebErrorKind::ClientNotFound,
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

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.error_kind {
            WebErrorKind::NotAcceptable => {
                (StatusCode::NOT_ACCEPTABLE, "NOT ACCEPTABLE").into_response()
            }
            WebErrorKind::ClientNotFound => (StatusCode::NOT_FOUND, "NOT FOUND").into_response(),
            WebErrorKind::ClientGone => (StatusCode::GONE, "GONE").into_response(),
            WebErrorKind::Internal => {
                log::error!("Internal error: {:?}", self.source);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
            }
        }
    }
}

// This is where we translate errors from the `sse` layer to the `web` layer.
impl From<SseError> for Error {
    fn from(err: SseError) -> Self {
        let error_kind = match err.error_kind {
            SseErrorKind::Connection(_) => WebErrorKind::ClientGone,
            SseErrorKind::Hook(_) => WebErrorKind::Internal,
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}
