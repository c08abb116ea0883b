//! Connection lifecycle extension points.
//!
//! [`ConnectionHooks`] is what the [`Manager`](crate::Manager) calls when a
//! client connects, reconnects or disconnects. The default method bodies
//! publish a [`ClientEvent`] to the manager's observers; an implementation can
//! override any of them and still call [`publish_connected`] /
//! [`publish_disconnected`] to keep observers informed.

use crate::connection::Connection;
use crate::error::Error;
use async_trait::async_trait;
use events::{EventHandler, EventPublisher, HandlerResult};
use log::*;
use std::sync::Arc;

/// Lifecycle notification delivered to observers.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A client connected. `last_event_id` is set when it resumed a previous
    /// stream.
    Connected {
        connection: Arc<Connection>,
        last_event_id: Option<String>,
    },
    /// A client's stream is gone and it has been removed from the registry.
    Disconnected { connection: Arc<Connection> },
}

impl ClientEvent {
    pub fn connection(&self) -> &Arc<Connection> {
        match self {
            ClientEvent::Connected { connection, .. } => connection,
            ClientEvent::Disconnected { connection } => connection,
        }
    }
}

/// Subscribers to [`ClientEvent`]s.
pub type Observers = EventPublisher<ClientEvent>;

#[async_trait]
pub trait ConnectionHooks: Send + Sync {
    /// Runs before a client without a resume marker is admitted. Returning an
    /// error keeps the connection out of the registry and closes it.
    async fn on_connect(
        &self,
        connection: &Arc<Connection>,
        observers: &Observers,
    ) -> Result<(), Error> {
        publish_connected(observers, connection, None).await;
        Ok(())
    }

    /// Runs instead of `on_connect` when the client supplied the id of the
    /// last event it received.
    async fn on_reconnect(
        &self,
        connection: &Arc<Connection>,
        last_event_id: &str,
        observers: &Observers,
    ) -> Result<(), Error> {
        publish_connected(observers, connection, Some(last_event_id)).await;
        Ok(())
    }

    /// Runs once, after the connection has been removed from the registry.
    async fn on_disconnect(&self, connection: &Arc<Connection>, observers: &Observers) {
        publish_disconnected(observers, connection).await;
    }
}

/// Hooks that only notify observers.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHooks;

impl ConnectionHooks for DefaultHooks {}

pub async fn publish_connected(
    observers: &Observers,
    connection: &Arc<Connection>,
    last_event_id: Option<&str>,
) {
    observers
        .publish(ClientEvent::Connected {
            connection: Arc::clone(connection),
            last_event_id: last_event_id.map(str::to_owned),
        })
        .await;
}

pub async fn publish_disconnected(observers: &Observers, connection: &Arc<Connection>) {
    observers
        .publish(ClientEvent::Disconnected {
            connection: Arc::clone(connection),
        })
        .await;
}

/// Observer that writes every lifecycle change to the log.
pub struct LifecycleLogger;

#[async_trait]
impl EventHandler<ClientEvent> for LifecycleLogger {
    async fn handle(&self, event: &ClientEvent) -> HandlerResult {
        match event {
            ClientEvent::Connected {
                connection,
                last_event_id: Some(last_event_id),
            } => {
                info!(
                    "SSE client {} reconnected (user: {}, last event id: {})",
                    connection.id(),
                    connection.user_id().unwrap_or("anonymous"),
                    last_event_id
                );
            }
            ClientEvent::Connected {
                connection,
                last_event_id: None,
            } => {
                info!(
                    "SSE client {} connected (user: {})",
                    connection.id(),
                    connection.user_id().unwrap_or("anonymous")
                );
            }
            ClientEvent::Disconnected { connection } => {
                info!("SSE client {} disconnected", connection.id());
            }
        }

        Ok(())
    }
}
