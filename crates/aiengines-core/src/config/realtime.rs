//! Real-time WebSocket hub configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound queue. Exact under both
    /// overflow policies.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// What to do when a connection's outbound queue is full.
    #[serde(default)]
    pub overflow_policy: OverflowPolicy,
    /// Maximum WebSocket connections per user (0 = unlimited).
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// Maximum accepted inbound frame size in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Periodic producer settings.
    #[serde(default)]
    pub producers: ProducerConfig,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            overflow_policy: OverflowPolicy::default(),
            max_connections_per_user: default_max_connections_per_user(),
            max_frame_bytes: default_max_frame_bytes(),
            producers: ProducerConfig::default(),
        }
    }
}

/// Policy applied when a slow consumer's outbound queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Close and unregister the connection.
    #[default]
    Disconnect,
    /// Discard the oldest queued frame and keep the connection.
    DropOldest,
}

/// Settings for the built-in periodic event producers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Whether the scheduler starts the built-in producers.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval between `agent_status_update` events.
    #[serde(default = "default_agent_interval")]
    pub agent_status_interval_seconds: u64,
    /// Interval between `task_progress_update` events.
    #[serde(default = "default_task_interval")]
    pub task_progress_interval_seconds: u64,
}

impl ProducerConfig {
    /// Agent status producer period.
    pub fn agent_status_interval(&self) -> Duration {
        Duration::from_secs(self.agent_status_interval_seconds)
    }

    /// Task progress producer period.
    pub fn task_progress_interval(&self) -> Duration {
        Duration::from_secs(self.task_progress_interval_seconds)
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            agent_status_interval_seconds: default_agent_interval(),
            task_progress_interval_seconds: default_task_interval(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_max_connections_per_user() -> usize {
    0
}

fn default_max_frame_bytes() -> usize {
    65_536
}

fn default_true() -> bool {
    true
}

fn default_agent_interval() -> u64 {
    10
}

fn default_task_interval() -> u64 {
    5
}
