//! Inbound frame shape, message type names, and outbound payload structs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client → server message type names.
pub mod inbound {
    /// Liveness probe; answered with `pong`.
    pub const PING: &str = "ping";
    /// Prefix of `subscribe_<topic>` frames.
    pub const SUBSCRIBE_PREFIX: &str = "subscribe_";
    /// Prefix of `unsubscribe_<topic>` frames.
    pub const UNSUBSCRIBE_PREFIX: &str = "unsubscribe_";
}

/// Server → client message type names.
pub mod outbound {
    pub const WELCOME: &str = "welcome";
    pub const PONG: &str = "pong";
    pub const SUBSCRIPTION_CONFIRMED: &str = "subscription_confirmed";
    pub const UNSUBSCRIPTION_CONFIRMED: &str = "unsubscription_confirmed";
    pub const ERROR: &str = "error";
    pub const AGENT_STATUS_UPDATE: &str = "agent_status_update";
    pub const TASK_PROGRESS_UPDATE: &str = "task_progress_update";
}

/// A parsed client frame. Only `type` is mandatory.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    /// Message type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional payload; `null` when absent.
    #[serde(default)]
    pub data: Value,
}

/// Payload of `agent_status_update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatusPayload {
    pub agent_id: String,
    pub status: String,
    pub performance: AgentPerformance,
}

/// Rolling performance figures for an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformance {
    pub tasks_completed: u32,
    /// Fraction in `[0, 1]`.
    pub success_rate: f64,
    /// Fraction in `[0, 1]`.
    pub uptime: f64,
}

/// Payload of `task_progress_update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgressPayload {
    pub task_id: String,
    /// Percentage in `[0, 100)`.
    pub progress: u8,
    pub status: String,
    pub logs: Vec<TaskLogEntry>,
}

/// One log line attached to a task progress update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}
