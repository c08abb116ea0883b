use crate::codec;
use crate::connection::{Connection, ConnectionId};
use crate::error::{connection_error, ConnectionErrorKind, Error};
use crate::event::ServerSentEvent;
use crate::hooks::{ClientEvent, ConnectionHooks, DefaultHooks, Observers};
use crate::registry::ConnectionRegistry;
use bytes::Bytes;
use events::EventHandler;
use futures::future::join_all;
use log::*;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Client registry and broadcast service.
///
/// One instance is built at startup and shared as an `Arc<Manager>` with every
/// code path that accepts or addresses connections.
pub struct Manager {
    registry: ConnectionRegistry,
    hooks: Arc<dyn ConnectionHooks>,
    observers: Observers,
    reconnect_interval: RwLock<Option<u32>>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            hooks: Arc::new(DefaultHooks),
            observers: Observers::new(),
            reconnect_interval: RwLock::new(None),
        }
    }

    /// Replace the lifecycle hooks.
    pub fn with_hooks(mut self, hooks: Arc<dyn ConnectionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Subscribe an observer to connect/disconnect notifications.
    pub fn with_observer(mut self, observer: Arc<dyn EventHandler<ClientEvent>>) -> Self {
        self.observers = self.observers.with_handler(observer);
        self
    }

    /// The connection with `connection_id`, if it is currently live.
    pub fn get_client(&self, connection_id: &ConnectionId) -> Option<Arc<Connection>> {
        self.registry.get(connection_id)
    }

    /// Snapshot of the live connections. Later admissions and evictions do not
    /// change the returned vector.
    pub fn list_clients(&self) -> Vec<Arc<Connection>> {
        self.registry.snapshot()
    }

    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    pub fn reconnect_interval(&self) -> Option<u32> {
        *self.reconnect_interval.read()
    }

    /// Store the reconnect interval for future connections and push it to every
    /// live one.
    pub async fn set_reconnect_interval(&self, millis: u32) {
        *self.reconnect_interval.write() = Some(millis);
        info!("SSE reconnect interval set to {millis}ms");

        self.fan_out(self.list_clients(), codec::encode_retry(millis), None)
            .await;
    }

    /// Broadcast `text` as a single data line to every live connection.
    pub async fn send_text(&self, text: &str) {
        self.fan_out(
            self.list_clients(),
            codec::encode_data(text.as_bytes()),
            None,
        )
        .await;
    }

    /// Broadcast `event` to every live connection. The event is encoded once.
    pub async fn send_event(&self, event: &ServerSentEvent) {
        self.fan_out(self.list_clients(), codec::encode_event(event), None)
            .await;
    }

    /// Send `event` to every live connection opened for `user_id` and return
    /// how many connections were addressed.
    pub async fn send_event_to_user(&self, user_id: &str, event: &ServerSentEvent) -> usize {
        let recipients = self.registry.snapshot_for_user(user_id);
        let count = recipients.len();

        if count == 0 {
            debug!("No live SSE connections for user {user_id}");
        }
        self.fan_out(recipients, codec::encode_event(event), None)
            .await;

        count
    }

    /// Broadcast the comment keep-alive frame.
    pub async fn send_keep_alive(&self) {
        self.fan_out(self.list_clients(), codec::keep_alive(), None)
            .await;
    }

    /// Spawn a task that broadcasts a keep-alive every `period`.
    ///
    /// A client that cannot take a keep-alive within one `period` is treated as
    /// stalled and evicted, so a reader that stopped reading never holds up the
    /// ticker for everyone else. `period` must be non-zero.
    pub fn spawn_keep_alive(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                trace!("Sending SSE keep-alive to {} client(s)", manager.client_count());
                manager
                    .fan_out(manager.list_clients(), codec::keep_alive(), Some(period))
                    .await;
            }
        })
    }

    /// Bring a pending connection live.
    ///
    /// Writes the stored reconnect interval, runs the reconnect hook when
    /// `last_event_id` is non-blank (the connect hook otherwise), and admits the
    /// connection once the hook has returned. A hook error leaves the
    /// connection out of the registry with its disconnect signal raised. A
    /// connection whose signal fired while the hook ran is not admitted
    /// either; it gets `on_disconnect` and `open` fails with `Closed`.
    pub async fn open(
        &self,
        connection: &Arc<Connection>,
        last_event_id: Option<&str>,
    ) -> Result<(), Error> {
        let applied_interval = self.reconnect_interval();
        if let Some(millis) = applied_interval {
            connection.set_reconnect_interval(millis).await?;
        }

        let hook_result = match last_event_id.filter(|id| !id.trim().is_empty()) {
            Some(last_event_id) => {
                self.hooks
                    .on_reconnect(connection, last_event_id, &self.observers)
                    .await
            }
            None => self.hooks.on_connect(connection, &self.observers).await,
        };

        if let Err(e) = hook_result {
            warn!("SSE connection {} rejected by hook: {e}", connection.id());
            connection.disconnect();
            return Err(e);
        }

        if !self.admit(Arc::clone(connection)) {
            // Closed while the hook ran; observers already saw it connect
            self.hooks.on_disconnect(connection, &self.observers).await;
            return Err(connection_error(
                ConnectionErrorKind::Closed,
                "connection closed before it was admitted",
            ));
        }

        // The interval may have changed while the hook ran, after the
        // broadcast snapshot that would have carried it was taken.
        let current_interval = self.reconnect_interval();
        if current_interval != applied_interval {
            if let Some(millis) = current_interval {
                if connection.set_reconnect_interval(millis).await.is_err() {
                    self.evict(connection).await;
                }
            }
        }

        Ok(())
    }

    /// Insert a connection into the live set and mark it connected.
    ///
    /// Returns `false`, leaving the live set untouched, when the connection's
    /// disconnect signal has fired or it was admitted before.
    pub fn admit(&self, connection: Arc<Connection>) -> bool {
        debug!("Admitting SSE connection {}", connection.id());

        let admitted = self.registry.register(connection);
        if admitted {
            info!("Registered new SSE connection");
        }
        admitted
    }

    /// Remove a connection from the live set and run the disconnect hook.
    ///
    /// The connection is marked disconnected before it is removed. Only the
    /// call that actually removes it runs the hook; the return value tells
    /// whether this call was that one.
    pub async fn evict(&self, connection: &Arc<Connection>) -> bool {
        connection.disconnect();

        match self.registry.unregister(connection) {
            Some(_) => {
                info!("Unregistering SSE connection {}", connection.id());
                self.hooks.on_disconnect(connection, &self.observers).await;
                true
            }
            None => false,
        }
    }

    /// Run a connection for its whole lifetime: open it, wait for its
    /// disconnect signal, evict it.
    pub async fn serve(
        &self,
        connection: Arc<Connection>,
        last_event_id: Option<String>,
    ) -> Result<(), Error> {
        self.open(&connection, last_event_id.as_deref()).await?;

        connection.disconnected().await;
        self.evict(&connection).await;

        Ok(())
    }

    async fn fan_out(
        &self,
        recipients: Vec<Arc<Connection>>,
        frame: Bytes,
        deadline: Option<Duration>,
    ) {
        let sends = recipients
            .iter()
            .map(|connection| self.deliver(connection, frame.clone(), deadline));

        join_all(sends).await;
    }

    async fn deliver(
        &self,
        connection: &Arc<Connection>,
        frame: Bytes,
        deadline: Option<Duration>,
    ) {
        if !connection.is_connected() {
            return;
        }

        let result = match deadline {
            Some(deadline) => tokio::time::timeout(deadline, connection.send_frame(frame))
                .await
                .unwrap_or_else(|_| {
                    Err(connection_error(
                        ConnectionErrorKind::TimedOut,
                        "client stopped reading its event stream",
                    ))
                }),
            None => connection.send_frame(frame).await,
        };

        if let Err(e) = result {
            warn!(
                "Failed to send event to connection {}: {}. Connection will be cleaned up.",
                connection.id(),
                e
            );
            self.evict(connection).await;
        }
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
