//! Connection registry: the live set of connections indexed by user.
//!
//! The registry is a plain data structure. The [`Hub`](crate::hub::Hub)
//! guards it together with the subscription store behind one lock.

use std::collections::HashMap;
use std::sync::Arc;

use aiengines_core::types::{ConnectionId, UserId};

use super::handle::ConnectionHandle;

/// Registered connections, indexed by user and by connection ID.
///
/// Invariant: a user key is present iff that user has at least one
/// registered connection.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// User ID → that user's connections.
    by_user: HashMap<UserId, HashMap<ConnectionId, Arc<ConnectionHandle>>>,
    /// Connection ID → connection handle for direct lookup.
    by_id: HashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection. Registering the same connection ID again is a no-op.
    ///
    /// Returns `true` if the connection was newly added.
    pub fn register(&mut self, handle: Arc<ConnectionHandle>) -> bool {
        if self.by_id.contains_key(&handle.id) {
            return false;
        }
        self.by_id.insert(handle.id, handle.clone());
        self.by_user
            .entry(handle.user_id.clone())
            .or_default()
            .insert(handle.id, handle);
        true
    }

    /// Removes a connection by ID. Absent IDs are ignored.
    ///
    /// Drops the user's entry once their last connection is gone.
    pub fn unregister(&mut self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let handle = self.by_id.remove(conn_id)?;
        if let Some(connections) = self.by_user.get_mut(&handle.user_id) {
            connections.remove(conn_id);
            if connections.is_empty() {
                self.by_user.remove(&handle.user_id);
            }
        }
        Some(handle)
    }

    /// Copy of a user's current connections (empty if none).
    pub fn snapshot(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|connections| connections.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Copy of every registered connection.
    pub fn snapshot_all(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id.values().cloned().collect()
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).cloned()
    }

    /// Whether a connection is registered.
    pub fn contains(&self, conn_id: &ConnectionId) -> bool {
        self.by_id.contains_key(conn_id)
    }

    /// The user's longest-lived connection, used for per-user cap eviction.
    pub fn oldest_for_user(&self, user_id: &UserId) -> Option<Arc<ConnectionHandle>> {
        self.by_user.get(user_id).and_then(|connections| {
            connections
                .values()
                .min_by_key(|c| (c.connected_at, c.id))
                .cloned()
        })
    }

    /// Number of connections the user currently has.
    pub fn user_connection_count(&self, user_id: &UserId) -> usize {
        self.by_user.get(user_id).map(HashMap::len).unwrap_or(0)
    }

    /// Returns total number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of distinct connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Returns all connected user IDs.
    pub fn connected_user_ids(&self) -> Vec<UserId> {
        self.by_user.keys().cloned().collect()
    }

    /// Removes every connection, returning them.
    pub fn drain(&mut self) -> Vec<Arc<ConnectionHandle>> {
        self.by_user.clear();
        self.by_id.drain().map(|(_, handle)| handle).collect()
    }
}
