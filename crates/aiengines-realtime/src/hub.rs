//! The hub facade: registration, subscriptions, and fan-out delivery.
//!
//! The registry and subscription store sit behind one [`RwLock`] so that
//! register/unregister/subscribe are mutually exclusive with snapshots.
//! Delivery never holds the lock: recipients are snapshotted, the guard is
//! released, and only then are frames queued.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use aiengines_core::config::RealtimeConfig;
use aiengines_core::{AppError, AppResult};
use aiengines_core::types::{ConnectionId, UserId};

use crate::connection::handle::ConnectionHandle;
use crate::connection::outbound::{self, OutboundReceiver};
use crate::connection::registry::ConnectionRegistry;
use crate::message::Envelope;
use crate::metrics::HubMetrics;
use crate::topic::{SubscriptionManager, Topic};

#[derive(Debug, Default)]
struct HubState {
    registry: ConnectionRegistry,
    subscriptions: SubscriptionManager,
}

/// Shared entry point for every real-time operation.
#[derive(Debug)]
pub struct Hub {
    state: RwLock<HubState>,
    config: RealtimeConfig,
    metrics: Arc<HubMetrics>,
    closed: AtomicBool,
}

impl Hub {
    /// Creates an empty hub.
    pub fn new(config: RealtimeConfig) -> Self {
        Self::with_metrics(config, Arc::new(HubMetrics::new()))
    }

    /// Creates an empty hub reporting into existing metrics.
    pub fn with_metrics(config: RealtimeConfig, metrics: Arc<HubMetrics>) -> Self {
        Self {
            state: RwLock::new(HubState::default()),
            config,
            metrics,
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<HubMetrics> {
        &self.metrics
    }

    /// Whether [`Hub::shutdown`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Creates and registers a connection for `user_id`.
    ///
    /// When the user is at `max_connections_per_user`, their oldest
    /// connection is closed and evicted first.
    pub async fn register(
        &self,
        user_id: UserId,
    ) -> AppResult<(Arc<ConnectionHandle>, OutboundReceiver)> {
        let conn_id = ConnectionId::new();
        let (sender, receiver) = outbound::channel(
            conn_id,
            self.config.outbound_buffer_size,
            self.config.overflow_policy,
            self.metrics.clone(),
        );
        let handle = Arc::new(ConnectionHandle::new(conn_id, user_id.clone(), sender));

        let evicted = {
            let mut state = self.state.write().await;
            // Checked under the lock so registration cannot race shutdown's drain.
            if self.is_closed() {
                return Err(AppError::service_unavailable("Real-time hub is shutting down"));
            }

            let mut evicted = Vec::new();
            let cap = self.config.max_connections_per_user;
            if cap > 0 {
                while state.registry.user_connection_count(&user_id) >= cap {
                    let Some(oldest) = state.registry.oldest_for_user(&user_id) else {
                        break;
                    };
                    state.registry.unregister(&oldest.id);
                    state.subscriptions.remove_connection(&oldest.id);
                    evicted.push(oldest);
                }
            }
            state.registry.register(handle.clone());
            evicted
        };

        for old in evicted {
            info!(
                conn_id = %old.id,
                user_id = %old.user_id,
                "Evicting oldest connection: per-user limit reached"
            );
            old.close();
            self.metrics.connection_closed();
        }

        self.metrics.connection_opened();
        info!(conn_id = %conn_id, user_id = %user_id, "Connection registered");
        Ok((handle, receiver))
    }

    /// Removes a connection and its subscriptions, then closes it.
    ///
    /// Returns `false` if the connection was not registered.
    pub async fn unregister(&self, conn_id: &ConnectionId) -> bool {
        let removed = {
            let mut state = self.state.write().await;
            let removed = state.registry.unregister(conn_id);
            if removed.is_some() {
                state.subscriptions.remove_connection(conn_id);
            }
            removed
        };

        match removed {
            Some(handle) => {
                handle.close();
                self.metrics.connection_closed();
                info!(conn_id = %conn_id, user_id = %handle.user_id, "Connection unregistered");
                true
            }
            None => false,
        }
    }

    /// Subscribes a registered connection to `topic`.
    ///
    /// Returns `true` if membership changed.
    pub async fn subscribe(&self, conn_id: &ConnectionId, topic: Topic) -> bool {
        let mut state = self.state.write().await;
        if !state.registry.contains(conn_id) {
            return false;
        }
        let changed = state.subscriptions.subscribe(*conn_id, topic);
        if changed {
            self.metrics.subscribed();
            debug!(conn_id = %conn_id, topic = %topic, "Subscribed");
        }
        changed
    }

    /// Unsubscribes a connection from `topic`. Returns `true` if membership changed.
    pub async fn unsubscribe(&self, conn_id: &ConnectionId, topic: Topic) -> bool {
        let changed = self
            .state
            .write()
            .await
            .subscriptions
            .unsubscribe(conn_id, topic);
        if changed {
            debug!(conn_id = %conn_id, topic = %topic, "Unsubscribed");
        }
        changed
    }

    pub async fn is_subscribed(&self, conn_id: &ConnectionId, topic: Topic) -> bool {
        self.state.read().await.subscriptions.is_subscribed(conn_id, topic)
    }

    pub async fn topics(&self, conn_id: &ConnectionId) -> HashSet<Topic> {
        self.state.read().await.subscriptions.topics(conn_id)
    }

    pub async fn subscriber_count(&self, topic: Topic) -> usize {
        self.state.read().await.subscriptions.subscriber_count(topic)
    }

    /// Delivers to every connection subscribed to `topic`.
    ///
    /// Returns the number of connections the frame was queued for.
    pub async fn publish(&self, topic: Topic, envelope: &Envelope) -> usize {
        let recipients: Vec<_> = {
            let state = self.state.read().await;
            state
                .registry
                .snapshot_all()
                .into_iter()
                .filter(|c| state.subscriptions.is_subscribed(&c.id, topic))
                .collect()
        };
        let delivered = self.deliver(recipients, envelope).await;
        debug!(topic = %topic, kind = %envelope.kind, delivered, "Published");
        delivered
    }

    /// Delivers to every registered connection regardless of subscriptions.
    pub async fn broadcast(&self, envelope: &Envelope) -> usize {
        let recipients = self.state.read().await.registry.snapshot_all();
        self.deliver(recipients, envelope).await
    }

    /// Delivers to all of one user's connections (possibly none).
    pub async fn send_to_user(&self, user_id: &UserId, envelope: &Envelope) -> usize {
        let recipients = self.state.read().await.registry.snapshot(user_id);
        self.deliver(recipients, envelope).await
    }

    /// Delivers to a single connection. Returns `true` if it was queued.
    pub async fn send_to_connection(&self, conn_id: &ConnectionId, envelope: &Envelope) -> bool {
        let recipient = self.state.read().await.registry.get(conn_id);
        match recipient {
            Some(conn) => self.deliver(vec![conn], envelope).await == 1,
            None => false,
        }
    }

    /// Copy of a user's current connections.
    pub async fn user_connections(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.state.read().await.registry.snapshot(user_id)
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.registry.connection_count()
    }

    pub async fn user_count(&self) -> usize {
        self.state.read().await.registry.user_count()
    }

    /// Closes every connection and rejects further registrations and sends.
    pub async fn shutdown(&self) {
        let drained = {
            let mut state = self.state.write().await;
            if self.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            state.subscriptions.clear();
            state.registry.drain()
        };

        let count = drained.len();
        for conn in drained {
            conn.close();
            self.metrics.connection_closed();
        }
        info!(connections = count, "Real-time hub shut down");
    }

    /// Queues one serialized frame for each recipient.
    ///
    /// Recipients whose queue rejects the frame are unregistered afterwards.
    async fn deliver(&self, recipients: Vec<Arc<ConnectionHandle>>, envelope: &Envelope) -> usize {
        if recipients.is_empty() || self.is_closed() {
            return 0;
        }

        let frame = match envelope.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(kind = %envelope.kind, error = %e, "Failed to serialize envelope");
                return 0;
            }
        };

        let mut delivered = 0usize;
        let mut failed = Vec::new();
        for conn in recipients {
            match conn.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        conn_id = %conn.id,
                        user_id = %conn.user_id,
                        kind = %envelope.kind,
                        error = %e,
                        "Delivery failed, dropping connection"
                    );
                    self.metrics.delivery_failed();
                    failed.push(conn.id);
                }
            }
        }

        self.metrics.messages_sent(delivered as u64);
        for conn_id in failed {
            self.unregister(&conn_id).await;
        }
        delivered
    }
}
