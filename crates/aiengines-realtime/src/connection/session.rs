//! Per-connection protocol state machine.

use std::sync::Arc;

use tracing::debug;

use aiengines_core::AppResult;
use aiengines_core::types::{ConnectionId, UserId};

use super::handle::ConnectionHandle;
use super::outbound::OutboundReceiver;
use crate::hub::Hub;
use crate::message::{Envelope, MessageRouter, builder};

/// Session lifecycle: `Connected → Closing → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Closing,
    Closed,
}

/// Drives one client connection from welcome to unregistration.
///
/// The transport feeds frames in arrival order through
/// [`ConnectionSession::handle_frame`] and calls
/// [`ConnectionSession::close`] once the socket ends. Replies are queued on
/// the connection's own outbound queue, so the session can be driven in
/// tests without a socket.
#[derive(Debug)]
pub struct ConnectionSession {
    hub: Arc<Hub>,
    router: MessageRouter,
    handle: Arc<ConnectionHandle>,
    state: SessionState,
}

impl ConnectionSession {
    /// Registers a connection for `user_id` and queues the welcome frame.
    pub async fn open(hub: Arc<Hub>, user_id: UserId) -> AppResult<(Self, OutboundReceiver)> {
        let (handle, outbound) = hub.register(user_id).await?;
        hub.send_to_connection(&handle.id, &builder::welcome()).await;

        let session = Self {
            router: MessageRouter::new(hub.clone()),
            hub,
            handle,
            state: SessionState::Connected,
        };
        Ok((session, outbound))
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.handle.user_id
    }

    pub fn handle(&self) -> &Arc<ConnectionHandle> {
        &self.handle
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Processes one inbound text frame and queues the reply.
    ///
    /// Returns the reply, or `None` if the session is no longer connected.
    pub async fn handle_frame(&mut self, raw: &str) -> Option<Envelope> {
        if self.state != SessionState::Connected {
            debug!(conn_id = %self.handle.id, "Ignoring frame on closed session");
            return None;
        }

        self.handle.touch();
        self.hub.metrics().message_received();

        let reply = self.router.route(&self.handle, raw).await;
        self.hub.send_to_connection(&self.handle.id, &reply).await;
        Some(reply)
    }

    /// Transport closed: unregister (dropping subscriptions) and finish.
    pub async fn close(&mut self) {
        if self.state != SessionState::Connected {
            return;
        }
        self.state = SessionState::Closing;
        self.handle.begin_closing();

        self.hub.unregister(&self.handle.id).await;
        self.handle.close();

        self.state = SessionState::Closed;
        debug!(conn_id = %self.handle.id, user_id = %self.handle.user_id, "Session closed");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::topic::Topic;
    use aiengines_core::config::RealtimeConfig;

    fn next(rx: &mut OutboundReceiver) -> Value {
        serde_json::from_str(&rx.try_recv().expect("frame queued")).unwrap()
    }

    #[tokio::test]
    async fn test_open_sends_welcome() {
        let hub = Arc::new(Hub::new(RealtimeConfig::default()));
        let (session, mut rx) = ConnectionSession::open(hub.clone(), UserId::from("u1"))
            .await
            .unwrap();

        let welcome = next(&mut rx);
        assert_eq!(welcome["type"], "welcome");
        assert_eq!(welcome["data"]["message"], "Connected to AI Engines Platform");
        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(hub.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_replies_are_queued_in_order() {
        let hub = Arc::new(Hub::new(RealtimeConfig::default()));
        let (mut session, mut rx) = ConnectionSession::open(hub, UserId::from("u1"))
            .await
            .unwrap();
        next(&mut rx);

        session.handle_frame(r#"{"type":"ping","data":{"x":1}}"#).await;
        session.handle_frame("garbage").await;
        session.handle_frame(r#"{"type":"ping"}"#).await;

        let pong = next(&mut rx);
        assert_eq!(pong["type"], "pong");
        assert_eq!(pong["data"], json!({"x": 1}));
        assert_eq!(next(&mut rx)["data"]["error"], "Invalid message format");
        assert_eq!(next(&mut rx)["type"], "pong");
        assert!(rx.try_recv().is_none());
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_close_unregisters_and_ignores_later_frames() {
        let hub = Arc::new(Hub::new(RealtimeConfig::default()));
        let (mut session, _rx) = ConnectionSession::open(hub.clone(), UserId::from("u1"))
            .await
            .unwrap();
        session.handle_frame(r#"{"type":"subscribe_task_updates"}"#).await;
        assert_eq!(hub.subscriber_count(Topic::TaskUpdates).await, 1);

        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(hub.connection_count().await, 0);
        assert_eq!(hub.subscriber_count(Topic::TaskUpdates).await, 0);
        assert!(session.handle_frame(r#"{"type":"ping"}"#).await.is_none());

        // Closing twice is harmless.
        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);
    }
}
