use crate::{AppState, Error};
use async_stream::stream;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use log::*;
use sse::Connection;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;

pub(crate) const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";
pub(crate) const LAST_EVENT_ID_HEADER: &str = "last-event-id";
/// Identity of the caller, forwarded to hooks and observers unexamined.
pub(crate) const USER_ID_HEADER: &str = "x-user-id";

/// SSE handler that establishes a long-lived connection for server push.
///
/// The response body is fed from a bounded channel that the connection writes
/// encoded frames into. When the client goes away the body is dropped, which
/// raises the connection's disconnect signal and lets the manager evict it.
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    if !accepts_event_stream(&headers) {
        return Err(Error::not_acceptable());
    }

    let last_event_id = header_string(&headers, LAST_EVENT_ID_HEADER);
    let user_id = header_string(&headers, USER_ID_HEADER);

    let (tx, mut rx) = mpsc::channel::<Bytes>(app_state.config.sse_channel_capacity);
    let connection = Arc::new(Connection::new(user_id, tx));
    let connection_id = connection.id().clone();
    let client_gone = connection.disconnect_signal().drop_guard();

    debug!("Establishing SSE connection {connection_id}");

    let manager = app_state.sse_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = manager.serve(connection, last_event_id).await {
            debug!("SSE connection was not admitted: {e}");
        }
    });

    // The stream ends once the connection (and with it the sender) is dropped
    let stream = stream! {
        let _client_gone = client_gone;

        while let Some(frame) = rx.recv().await {
            yield Ok::<Bytes, Infallible>(frame);
        }

        debug!("SSE stream for connection {connection_id} finished");
    };

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(EVENT_STREAM_CONTENT_TYPE),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::CONTENT_ENCODING, HeaderValue::from_static("identity")),
            (
                HeaderName::from_static("x-accel-buffering"),
                HeaderValue::from_static("no"),
            ),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// True when one of the `Accept` media types is `text/event-stream`.
fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|media_range| media_range.split(';').next())
        .any(|media_type| media_type.trim() == EVENT_STREAM_CONTENT_TYPE)
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(accept: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_str(accept).unwrap());
        headers
    }

    #[test]
    fn test_accepts_event_stream() {
        assert!(accepts_event_stream(&headers("text/event-stream")));
        assert!(accepts_event_stream(&headers(
            "text/html, text/event-stream;q=0.9"
        )));
    }

    #[test]
    fn test_rejects_other_media_types() {
        assert!(!accepts_event_stream(&headers("application/json")));
        assert!(!accepts_event_stream(&headers("*/*")));
        assert!(!accepts_event_stream(&HeaderMap::new()));
    }
}
