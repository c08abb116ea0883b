use crate::codec;
use crate::error::{connection_error, ConnectionErrorKind, Error};
use crate::event::ServerSentEvent;
use async_trait::async_trait;
use bytes::Bytes;
use log::*;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

const PENDING: u8 = 0;
const CONNECTED: u8 = 1;
const DISCONNECTED: u8 = 2;

// The principal a connection was opened for. Carried through to hooks and
// observers, never interpreted here.
pub type UserId = String;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination for the encoded frames of one connection.
///
/// A write hands over one complete frame; implementations must either accept
/// all of it or none of it.
#[async_trait]
pub trait EventSink: Send {
    async fn write(&mut self, frame: Bytes) -> Result<(), Error>;
}

#[async_trait]
impl EventSink for mpsc::Sender<Bytes> {
    async fn write(&mut self, frame: Bytes) -> Result<(), Error> {
        self.send(frame).await.map_err(|_| {
            connection_error(
                ConnectionErrorKind::SinkClosed,
                "event stream receiver was dropped",
            )
        })
    }
}

#[async_trait]
impl EventSink for mpsc::UnboundedSender<Bytes> {
    async fn write(&mut self, frame: Bytes) -> Result<(), Error> {
        self.send(frame).map_err(|_| {
            connection_error(
                ConnectionErrorKind::SinkClosed,
                "event stream receiver was dropped",
            )
        })
    }
}

/// One client's end of the event stream.
///
/// A connection starts out disconnected (pending), becomes connected when the
/// [`Manager`](crate::Manager) admits it, and is disconnected for good when it
/// is evicted; it never becomes connected again after that.
///
/// Frames are written one at a time: the sink sits behind an async mutex that
/// is held for the whole write, so concurrent senders queue up in arrival order
/// and never interleave.
pub struct Connection {
    id: ConnectionId,
    user_id: Option<UserId>,
    state: AtomicU8,
    sink: Mutex<Box<dyn EventSink>>,
    disconnect: CancellationToken,
}

impl Connection {
    pub fn new(user_id: Option<UserId>, sink: impl EventSink + 'static) -> Self {
        Self {
            id: ConnectionId::new(),
            user_id,
            state: AtomicU8::new(PENDING),
            sink: Mutex::new(Box::new(sink)),
            disconnect: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.state.load(Ordering::Acquire) == CONNECTED
    }

    /// True once the disconnect signal has been raised.
    pub fn is_closed(&self) -> bool {
        self.disconnect.is_cancelled()
    }

    /// Pending -> connected. Fails for a connection that was already
    /// connected or has been disconnected.
    pub(crate) fn mark_connected(&self) -> bool {
        self.state
            .compare_exchange(PENDING, CONNECTED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn mark_disconnected(&self) {
        self.state.store(DISCONNECTED, Ordering::Release);
    }

    /// The one-shot signal raised when the remote end is gone. The boundary
    /// that owns the transport cancels it; a failed write cancels it too.
    pub fn disconnect_signal(&self) -> CancellationToken {
        self.disconnect.clone()
    }

    /// Raises the disconnect signal. Idempotent.
    pub fn disconnect(&self) {
        self.disconnect.cancel();
    }

    /// Resolves once the disconnect signal has been raised.
    pub async fn disconnected(&self) {
        self.disconnect.cancelled().await;
    }

    /// Writes a `retry`-only frame.
    pub async fn set_reconnect_interval(&self, millis: u32) -> Result<(), Error> {
        self.send_frame(codec::encode_retry(millis)).await
    }

    /// Writes `data` as one data frame, without splitting on line breaks.
    pub async fn send_data(&self, data: &[u8]) -> Result<(), Error> {
        self.send_frame(codec::encode_data(data)).await
    }

    pub async fn send_event(&self, event: &ServerSentEvent) -> Result<(), Error> {
        self.send_frame(codec::encode_event(event)).await
    }

    pub async fn send_keep_alive(&self) -> Result<(), Error> {
        self.send_frame(codec::keep_alive()).await
    }

    /// Writes an already encoded frame.
    ///
    /// Fails with `Closed` once the disconnect signal is raised, including for
    /// a write that is still waiting on the sink at that moment. A sink failure
    /// raises the disconnect signal before the error is returned.
    pub async fn send_frame(&self, frame: Bytes) -> Result<(), Error> {
        if self.disconnect.is_cancelled() {
            return Err(self.closed_error());
        }

        let result = tokio::select! {
            biased;
            _ = self.disconnect.cancelled() => Err(self.closed_error()),
            result = self.write_exclusive(frame) => result,
        };

        if let Err(e) = &result {
            debug!("Write to connection {} failed: {e}", self.id);
            self.disconnect.cancel();
        }

        result
    }

    async fn write_exclusive(&self, frame: Bytes) -> Result<(), Error> {
        let mut sink = self.sink.lock().await;
        trace!("Writing {} byte frame to connection {}", frame.len(), self.id);
        sink.write(frame).await
    }

    fn closed_error(&self) -> Error {
        connection_error(ConnectionErrorKind::Closed, "connection is disconnected")
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::future::join_all;
    use std::sync::Arc;
    use std::time::Duration;

    /// Writes each frame in two halves with a yield in between, so an
    /// unserialized writer would interleave frames.
    struct ChunkingSink(Arc<parking_lot::Mutex<Vec<u8>>>);

    #[async_trait]
    impl EventSink for ChunkingSink {
        async fn write(&mut self, frame: Bytes) -> Result<(), Error> {
            let (head, tail) = frame.split_at(frame.len() / 2);
            self.0.lock().extend_from_slice(head);
            tokio::task::yield_now().await;
            self.0.lock().extend_from_slice(tail);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_send_event_writes_encoded_frame_to_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        let connection = Connection::new(Some("user-1".to_string()), tx);

        let event = ServerSentEvent::new().with_id("1").with_data_line("hello");
        connection.send_event(&event).await.unwrap();

        assert_eq!(&rx.recv().await.unwrap()[..], b"id: 1\ndata: hello\n\n");
        assert_eq!(connection.user_id(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_set_reconnect_interval_writes_retry_only_frame() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        let connection = Connection::new(None, tx);

        connection.set_reconnect_interval(3000).await.unwrap();

        assert_eq!(&rx.recv().await.unwrap()[..], b"retry: 3000\n\n");
    }

    #[tokio::test]
    async fn test_concurrent_sends_never_interleave() {
        let written = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let connection = Arc::new(Connection::new(None, ChunkingSink(written.clone())));

        let sends = (0..50).map(|i| {
            let connection = connection.clone();
            async move {
                let event = ServerSentEvent::new()
                    .with_id(i.to_string())
                    .with_data_line(format!("payload-{i}"));
                connection.send_event(&event).await
            }
        });
        for result in join_all(sends).await {
            result.unwrap();
        }

        let output = String::from_utf8(written.lock().clone()).unwrap();
        let mut frames: Vec<&str> = output.split_terminator("\n\n").collect();
        assert_eq!(frames.len(), 50);

        frames.sort();
        let mut expected: Vec<String> = (0..50)
            .map(|i| format!("id: {i}\ndata: payload-{i}"))
            .collect();
        expected.sort();
        assert_eq!(frames, expected);
    }

    #[tokio::test]
    async fn test_frames_keep_issue_order_on_one_connection() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        let connection = Connection::new(None, tx);

        for i in 0..10 {
            connection.send_data(i.to_string().as_bytes()).await.unwrap();
        }

        for i in 0..10 {
            assert_eq!(rx.recv().await.unwrap(), codec::encode_data(i.to_string().as_bytes()));
        }
    }

    #[tokio::test]
    async fn test_sink_failure_is_reported_and_raises_disconnect_signal() {
        let (tx, rx) = mpsc::unbounded_channel::<Bytes>();
        drop(rx);
        let connection = Connection::new(None, tx);

        let err = connection.send_data(b"lost").await.unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Connection(ConnectionErrorKind::SinkClosed)
        );
        assert!(connection.disconnect_signal().is_cancelled());
    }

    #[tokio::test]
    async fn test_write_after_disconnect_fails_closed() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        let connection = Connection::new(None, tx);

        connection.disconnect();
        let err = connection.send_keep_alive().await.unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::Connection(ConnectionErrorKind::Closed));
        assert!(rx.try_recv().is_err(), "nothing should reach the sink");
    }

    #[tokio::test]
    async fn test_in_flight_write_fails_promptly_on_disconnect() {
        let (tx, _rx) = mpsc::channel::<Bytes>(1);
        let connection = Arc::new(Connection::new(None, tx));

        // Fill the channel so the next write parks on the sink.
        connection.send_data(b"first").await.unwrap();
        let blocked = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send_data(b"second").await }
        });
        tokio::task::yield_now().await;

        connection.disconnect();
        let result = tokio::time::timeout(Duration::from_secs(1), blocked)
            .await
            .expect("blocked write should finish once disconnected")
            .unwrap();

        assert_eq!(
            result.unwrap_err().error_kind,
            ErrorKind::Connection(ConnectionErrorKind::Closed)
        );
    }

    #[test]
    fn test_disconnected_connection_cannot_be_marked_connected_again() {
        let (tx, _rx) = mpsc::unbounded_channel::<Bytes>();
        let connection = Connection::new(None, tx);

        assert!(connection.mark_connected());
        assert!(!connection.mark_connected());
        connection.mark_disconnected();

        assert!(!connection.mark_connected());
        assert!(!connection.is_connected());
    }

    #[test]
    fn test_new_connection_is_pending_with_unique_id() {
        let (tx, _rx) = mpsc::unbounded_channel::<Bytes>();
        let first = Connection::new(None, tx.clone());
        let second = Connection::new(None, tx);

        assert!(!first.is_connected());
        assert_ne!(first.id(), second.id());
    }
}
