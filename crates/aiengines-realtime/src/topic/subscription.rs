//! Subscription tracking: which connections want which topics.

use std::collections::{HashMap, HashSet};

use aiengines_core::types::ConnectionId;

use super::types::Topic;

/// Tracks connection-to-topic subscription mappings.
///
/// Like the registry, this is a plain structure guarded by the hub lock.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Connection ID → set of topics. Connections with no topics have no entry.
    by_connection: HashMap<ConnectionId, HashSet<Topic>>,
}

impl SubscriptionManager {
    /// Creates an empty subscription store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a subscription. Returns `true` if membership changed.
    pub fn subscribe(&mut self, conn_id: ConnectionId, topic: Topic) -> bool {
        self.by_connection.entry(conn_id).or_default().insert(topic)
    }

    /// Removes a subscription. Returns `true` if membership changed.
    pub fn unsubscribe(&mut self, conn_id: &ConnectionId, topic: Topic) -> bool {
        let Some(topics) = self.by_connection.get_mut(conn_id) else {
            return false;
        };
        let removed = topics.remove(&topic);
        if topics.is_empty() {
            self.by_connection.remove(conn_id);
        }
        removed
    }

    /// Whether the connection receives `topic`.
    pub fn is_subscribed(&self, conn_id: &ConnectionId, topic: Topic) -> bool {
        self.by_connection
            .get(conn_id)
            .is_some_and(|topics| topics.contains(&topic))
    }

    /// Topics a connection is subscribed to.
    pub fn topics(&self, conn_id: &ConnectionId) -> HashSet<Topic> {
        self.by_connection.get(conn_id).cloned().unwrap_or_default()
    }

    /// Number of connections subscribed to `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.by_connection
            .values()
            .filter(|topics| topics.contains(&topic))
            .count()
    }

    /// Removes all subscriptions for a connection.
    pub fn remove_connection(&mut self, conn_id: &ConnectionId) -> HashSet<Topic> {
        self.by_connection.remove(conn_id).unwrap_or_default()
    }

    /// Drops every subscription.
    pub fn clear(&mut self) {
        self.by_connection.clear();
    }
}
