//! The `{type, data, timestamp}` frame shared by every inbound and outbound message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use aiengines_core::AppResult;

/// Envelope wrapping every frame on the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type discriminator (e.g. `pong`, `agent_status_update`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Arbitrary JSON payload.
    pub data: Value,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Create a new envelope stamped with the current time
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// Create an envelope from any serializable payload
    pub fn from_payload<T: Serialize>(kind: impl Into<String>, payload: &T) -> AppResult<Self> {
        Ok(Self::new(kind, serde_json::to_value(payload)?))
    }

    /// Serialize to the JSON text sent over the socket
    pub fn to_frame(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_frame_uses_type_key() {
        let env = Envelope::new("pong", json!({"n": 1}));
        let value: Value = serde_json::from_str(&env.to_frame().unwrap()).unwrap();
        assert_eq!(value["type"], "pong");
        assert_eq!(value["data"], json!({"n": 1}));
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
        assert!(value.get("kind").is_none());
    }
}
