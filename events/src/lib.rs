//! Observer infrastructure for the SSE platform.
//!
//! This crate provides the multicast notification mechanism that lets any
//! number of independent subscribers react to an event without knowing about
//! each other or about the component that raised the event.
//!
//! # Architecture
//!
//! - **EventHandler**: Trait for implementing a subscriber of events of type `E`
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates. The event type is a
//! generic parameter so that the `sse` crate can publish its own client
//! lifecycle events through it.

use async_trait::async_trait;
use futures::FutureExt;
use log::*;
use std::error::Error as StdError;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Outcome of a single handler invocation. An `Err` is logged by the
/// publisher and never reaches the publisher's caller.
pub type HandlerResult = Result<(), Box<dyn StdError + Send + Sync>>;

/// Trait for handling published events.
/// Implementations can perform side effects like logging, metrics, cache
/// invalidation, sending follow-up notifications, etc.
#[async_trait]
pub trait EventHandler<E>: Send + Sync
where
    E: Send + Sync,
{
    async fn handle(&self, event: &E) -> HandlerResult;
}

/// Publishes events to registered handlers.
/// Handlers are called sequentially in registration order.
pub struct EventPublisher<E: Send + Sync> {
    handlers: Arc<Vec<Arc<dyn EventHandler<E>>>>,
}

impl<E: Send + Sync> EventPublisher<E> {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher wherever events are raised.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler<E>>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Publish an event to all registered handlers.
    /// Handlers are called sequentially. If a handler returns an error or
    /// panics, it is logged and the remaining handlers still run.
    pub async fn publish(&self, event: E) {
        for (index, handler) in self.handlers.iter().enumerate() {
            match AssertUnwindSafe(handler.handle(&event)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Event handler #{index} failed: {e}");
                }
                Err(_) => {
                    error!("Event handler #{index} panicked, continuing with remaining handlers");
                }
            }
        }
    }
}

impl<E: Send + Sync> Clone for EventPublisher<E> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
        }
    }
}

impl<E: Send + Sync> Default for EventPublisher<E> {
    fn default() -> Self {
        Self::new()
    }
}
