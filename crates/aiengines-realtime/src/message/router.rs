//! Inbound frame dispatch.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::builder;
use super::envelope::Envelope;
use super::types::{InboundFrame, inbound};
use super::validator;
use crate::connection::handle::ConnectionHandle;
use crate::hub::Hub;
use crate::topic::Topic;

/// Turns one raw client frame into exactly one reply envelope.
///
/// Malformed and unknown frames produce an `error` reply; nothing the
/// client sends causes the connection to close.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    hub: Arc<Hub>,
    max_frame_bytes: usize,
}

impl MessageRouter {
    pub fn new(hub: Arc<Hub>) -> Self {
        let max_frame_bytes = hub.config().max_frame_bytes;
        Self {
            hub,
            max_frame_bytes,
        }
    }

    /// Parses and dispatches `raw` on behalf of `conn`.
    pub async fn route(&self, conn: &ConnectionHandle, raw: &str) -> Envelope {
        if let Err(e) = validator::validate_inbound(raw, self.max_frame_bytes) {
            debug!(conn_id = %conn.id, error = %e, "Rejected inbound frame");
            self.hub.metrics().protocol_error();
            return builder::invalid_format();
        }

        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                debug!(conn_id = %conn.id, error = %e, "Unparseable inbound frame");
                self.hub.metrics().protocol_error();
                return builder::invalid_format();
            }
        };

        // A present but non-string `type` is still a type, just not one we know.
        match value.get("type") {
            Some(Value::String(_)) => {}
            Some(other) => {
                let kind = other.to_string();
                debug!(conn_id = %conn.id, kind = %kind, "Non-string message type");
                self.hub.metrics().protocol_error();
                return builder::unknown_type(&kind);
            }
            None => {
                debug!(conn_id = %conn.id, "Inbound frame has no type");
                self.hub.metrics().protocol_error();
                return builder::invalid_format();
            }
        }

        match serde_json::from_value::<InboundFrame>(value) {
            Ok(frame) => self.dispatch(conn, frame).await,
            Err(e) => {
                debug!(conn_id = %conn.id, error = %e, "Malformed inbound frame");
                self.hub.metrics().protocol_error();
                builder::invalid_format()
            }
        }
    }

    async fn dispatch(&self, conn: &ConnectionHandle, frame: InboundFrame) -> Envelope {
        let kind = frame.kind.as_str();

        if kind == inbound::PING {
            return builder::pong(frame.data);
        }

        if let Some(topic) = topic_suffix(kind, inbound::SUBSCRIBE_PREFIX) {
            self.hub.subscribe(&conn.id, topic).await;
            return builder::subscription_confirmed(topic);
        }

        if let Some(topic) = topic_suffix(kind, inbound::UNSUBSCRIBE_PREFIX) {
            self.hub.unsubscribe(&conn.id, topic).await;
            return builder::unsubscription_confirmed(topic);
        }

        debug!(conn_id = %conn.id, kind, "Unknown message type");
        self.hub.metrics().protocol_error();
        builder::unknown_type(kind)
    }
}

fn topic_suffix(kind: &str, prefix: &str) -> Option<Topic> {
    kind.strip_prefix(prefix).and_then(Topic::parse)
}
