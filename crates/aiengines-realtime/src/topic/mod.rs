//! Broadcast topics and per-connection subscriptions.

pub mod subscription;
pub mod types;

pub use subscription::SubscriptionManager;
pub use types::Topic;
