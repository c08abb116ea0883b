//! Server-Sent Events (SSE) engine for pushing events to many clients.
//!
//! This crate holds the transport-independent core: the client registry, the
//! broadcast service, the per-connection protocol endpoint and the wire codec.
//! Accepting HTTP requests and owning the response body is left to the caller
//! (see the `web` crate), which hands each new client over as a
//! [`Connection`] wrapped around an [`EventSink`].
//!
//! # Architecture
//!
//! - **Single writer per connection**: every frame for a connection is written
//!   while holding that connection's sink mutex, so frames never interleave.
//! - **Dual-index registry**: O(1) lookups by connection id and by user id via
//!   separate DashMap indices.
//! - **Encode once, fan out**: a broadcast encodes its frame a single time and
//!   sends the shared bytes to a snapshot of live connections concurrently.
//! - **Failure isolation**: a connection whose sink fails is evicted; the
//!   broadcast that hit the failure still completes for everyone else.
//! - **Ephemeral messages**: nothing is replayed. A reconnecting client's
//!   `Last-Event-ID` is only forwarded to the reconnect hook.
//!
//! # Connection Lifecycle
//!
//! 1. The boundary builds a `Connection` (pending, not yet connected)
//! 2. `Manager::open` writes the stored reconnect interval, then runs
//!    `on_reconnect` when a last event id was supplied, `on_connect` otherwise
//! 3. The connection is admitted and starts receiving broadcasts
//! 4. The boundary raises the connection's disconnect signal when the client
//!    goes away (a failed write raises it too)
//! 5. `Manager::evict` marks it disconnected, removes it and runs
//!    `on_disconnect`
//!
//! # Example: Broadcasting an event
//!
//! ```rust,ignore
//! use sse::ServerSentEvent;
//!
//! let event = ServerSentEvent::new()
//!     .with_id("42")
//!     .with_event_type("report_ready")
//!     .with_json_data(&report)?;
//!
//! app_state.sse_manager.send_event(&event).await;
//! ```
//!
//! # Modules
//!
//! - `codec`: wire format serialization
//! - `connection`: per-client endpoint, `ConnectionId` and the `EventSink` seam
//! - `event`: the `ServerSentEvent` envelope
//! - `hooks`: lifecycle hooks and observer notifications
//! - `manager`: registry-backed broadcast service
//! - `registry`: the concurrent connection map

pub mod codec;
pub mod connection;
pub mod error;
pub mod event;
pub mod hooks;
pub mod manager;
pub mod registry;

pub use connection::{Connection, ConnectionId, EventSink, UserId};
pub use error::Error;
pub use event::ServerSentEvent;
pub use hooks::{ClientEvent, ConnectionHooks, DefaultHooks, LifecycleLogger, Observers};
pub use manager::Manager;
