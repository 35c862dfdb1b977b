//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use aiengines_core::types::{ConnectionId, UserId};

use super::outbound::{DeliveryError, OutboundSender};

/// Liveness of a connection as seen by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Registered and accepting frames.
    Open,
    /// Transport is closing; no further deliveries are attempted.
    Closing,
    /// Unregistered.
    Closed,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Closing => 1,
            Self::Closed => 2,
        }
    }
}

/// A handle to a single WebSocket connection.
///
/// Holds the sender half of the bounded outbound queue plus metadata about
/// the connected user. The transport owns the socket; the hub only keeps
/// this handle while the connection is registered.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User who owns this connection
    pub user_id: UserId,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    sender: OutboundSender,
    state: AtomicU8,
    last_seen_ms: AtomicI64,
    closed: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new open connection handle
    pub fn new(id: ConnectionId, user_id: UserId, sender: OutboundSender) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            connected_at: now,
            sender,
            state: AtomicU8::new(ConnectionState::Open.as_u8()),
            last_seen_ms: AtomicI64::new(now.timestamp_millis()),
            closed: CancellationToken::new(),
        }
    }

    /// Queue a serialized frame for this connection.
    pub fn send(&self, frame: String) -> Result<(), DeliveryError> {
        if !self.is_open() {
            return Err(DeliveryError::Closed);
        }
        self.sender.try_send(frame)
    }

    /// Current liveness state
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Check if connection is open
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Move Open → Closing. Returns false if the connection was not open.
    pub fn begin_closing(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Open.as_u8(),
                ConnectionState::Closing.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Mark the connection closed and wake the transport tasks.
    pub fn close(&self) {
        self.state
            .store(ConnectionState::Closed.as_u8(), Ordering::SeqCst);
        self.closed.cancel();
    }

    /// Token cancelled once the connection is closed by either side.
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Update last-seen timestamp
    pub fn touch(&self) {
        self.last_seen_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// Last time a frame arrived from the client
    pub fn last_seen(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_seen_ms.load(Ordering::Relaxed))
            .unwrap_or(self.connected_at)
    }

    /// Get a snapshot of connection info
    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            user_id: self.user_id.clone(),
            state: self.state(),
            connected_at: self.connected_at,
            last_seen: self.last_seen(),
        }
    }
}

/// Snapshot of connection info (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// User ID
    pub user_id: UserId,
    /// Liveness
    pub state: ConnectionState,
    /// Connected at
    pub connected_at: DateTime<Utc>,
    /// Last frame received
    pub last_seen: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::connection::outbound;
    use crate::metrics::HubMetrics;
    use aiengines_core::config::OverflowPolicy;

    fn handle() -> (ConnectionHandle, outbound::OutboundReceiver) {
        let id = ConnectionId::new();
        let (tx, rx) = outbound::channel(id, 4, OverflowPolicy::Disconnect, Arc::new(HubMetrics::new()));
        (ConnectionHandle::new(id, UserId::from("u1"), tx), rx)
    }

    #[tokio::test]
    async fn test_send_while_open() {
        let (conn, mut rx) = handle();
        conn.send("hello".to_string()).unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }

    #[test]
    fn test_closed_connection_rejects_sends() {
        let (conn, _rx) = handle();
        conn.close();
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(conn.closed_token().is_cancelled());
        assert_eq!(conn.send("x".to_string()), Err(DeliveryError::Closed));
    }

    #[test]
    fn test_begin_closing_only_from_open() {
        let (conn, _rx) = handle();
        assert!(conn.begin_closing());
        assert!(!conn.begin_closing());
        assert_eq!(conn.state(), ConnectionState::Closing);
        assert_eq!(conn.send("x".to_string()), Err(DeliveryError::Closed));
    }

    #[test]
    fn test_info_snapshot() {
        let (conn, _rx) = handle();
        conn.touch();
        let info = conn.info();
        assert_eq!(info.id, conn.id);
        assert_eq!(info.state, ConnectionState::Open);
    }
}
