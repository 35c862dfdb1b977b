//! Constructors for every server-initiated envelope.

use serde_json::{Value, json};

use aiengines_core::AppResult;

use super::envelope::Envelope;
use super::types::{AgentStatusPayload, TaskProgressPayload, outbound};
use crate::topic::Topic;

/// Greeting sent once, immediately after a connection is registered.
pub fn welcome() -> Envelope {
    Envelope::new(
        outbound::WELCOME,
        json!({ "message": "Connected to AI Engines Platform" }),
    )
}

/// Reply to `ping`, echoing its data.
pub fn pong(data: Value) -> Envelope {
    Envelope::new(outbound::PONG, data)
}

/// Generic error envelope.
pub fn error(message: impl Into<String>) -> Envelope {
    Envelope::new(outbound::ERROR, json!({ "error": message.into() }))
}

/// Frame was not a JSON object with a string `type`.
pub fn invalid_format() -> Envelope {
    error("Invalid message format")
}

/// Frame type is not part of the protocol.
pub fn unknown_type(kind: &str) -> Envelope {
    error(format!("Unknown message type: {kind}"))
}

pub fn subscription_confirmed(topic: Topic) -> Envelope {
    Envelope::new(
        outbound::SUBSCRIPTION_CONFIRMED,
        json!({ "subscription": topic.as_str() }),
    )
}

pub fn unsubscription_confirmed(topic: Topic) -> Envelope {
    Envelope::new(
        outbound::UNSUBSCRIPTION_CONFIRMED,
        json!({ "subscription": topic.as_str() }),
    )
}

pub fn agent_status_update(payload: &AgentStatusPayload) -> AppResult<Envelope> {
    Envelope::from_payload(outbound::AGENT_STATUS_UPDATE, payload)
}

pub fn task_progress_update(payload: &TaskProgressPayload) -> AppResult<Envelope> {
    Envelope::from_payload(outbound::TASK_PROGRESS_UPDATE, payload)
}
