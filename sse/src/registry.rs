use crate::connection::{Connection, ConnectionId, UserId};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Concurrent connection registry with dual indices for O(1) lookups.
///
/// Registering marks a connection connected before it becomes reachable;
/// unregistering marks it disconnected before it is removed. Lookups and
/// snapshots only ever yield connected entries.
pub struct ConnectionRegistry {
    /// Primary storage: lookup by connection_id for registration/cleanup - O(1)
    connections: DashMap<ConnectionId, Arc<Connection>>,

    /// Secondary index: fast lookup by user_id for targeted sends - O(1)
    user_index: DashMap<UserId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_index: DashMap::new(),
        }
    }

    /// Register a connection - O(1)
    ///
    /// Refused (returns `false`) for a connection whose disconnect signal has
    /// fired or that was registered before.
    pub fn register(&self, connection: Arc<Connection>) -> bool {
        if connection.is_closed() || !connection.mark_connected() {
            return false;
        }

        let connection_id = connection.id().clone();
        let user_id = connection.user_id().map(str::to_owned);

        // Index first so whoever removes the primary entry also finds this one
        if let Some(user_id) = user_id {
            self.user_index
                .entry(user_id)
                .or_default()
                .insert(connection_id.clone());
        }

        self.connections.insert(connection_id, Arc::clone(&connection));

        // An eviction racing with the insert may have missed the entry. If it
        // did, take the entry back out; if it didn't, it already cleaned up.
        if connection.is_closed() {
            return self.unregister(&connection).is_none();
        }

        true
    }

    /// Unregister a connection - O(1)
    ///
    /// Returns the removed entry, or `None` when the connection was not (or no
    /// longer) registered.
    pub fn unregister(&self, connection: &Connection) -> Option<Arc<Connection>> {
        connection.mark_disconnected();

        let (connection_id, removed) = self.connections.remove(connection.id())?;

        if let Some(user_id) = removed.user_id() {
            if let Some(mut entry) = self.user_index.get_mut(user_id) {
                entry.remove(&connection_id);
            }
            // Only drops the entry if no connection for this user was added meanwhile
            self.user_index.remove_if(user_id, |_, ids| ids.is_empty());
        }

        Some(removed)
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<Arc<Connection>> {
        self.connections
            .get(connection_id)
            .map(|entry| Arc::clone(entry.value()))
            .filter(|connection| connection.is_connected())
    }

    /// Point-in-time copy of every connected entry.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .filter(|entry| entry.value().is_connected())
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Point-in-time copy of one user's connected entries.
    pub fn snapshot_for_user(&self, user_id: &str) -> Vec<Arc<Connection>> {
        let connection_ids: Vec<ConnectionId> = match self.user_index.get(user_id) {
            Some(ids) => ids.iter().cloned().collect(),
            None => return Vec::new(),
        };

        connection_ids
            .iter()
            .filter_map(|connection_id| self.get(connection_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
