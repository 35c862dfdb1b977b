//! # aiengines-realtime
//!
//! Real-time notification hub for the AI Engines dashboard. Provides:
//!
//! - Connection registry keyed by user, with bounded per-connection outbound queues
//! - Topic subscriptions (`agent_updates`, `task_updates`)
//! - The `{type, data, timestamp}` wire protocol and its inbound router
//! - A per-connection session state machine
//! - Periodic producers with group cancellation
//! - Hub-level metrics

pub mod connection;
pub mod hub;
pub mod message;
pub mod metrics;
pub mod scheduler;
pub mod server;
pub mod topic;

pub use connection::{ConnectionSession, WsAuthenticator};
pub use hub::Hub;
pub use message::Envelope;
pub use metrics::{HubMetrics, MetricsSnapshot};
pub use scheduler::{BroadcastScheduler, Producer};
pub use server::RealtimeEngine;
pub use topic::Topic;
