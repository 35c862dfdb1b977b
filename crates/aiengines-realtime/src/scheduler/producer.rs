//! Periodic event producer trait.

use std::time::Duration;

use async_trait::async_trait;

use aiengines_core::AppResult;

use crate::message::Envelope;
use crate::topic::Topic;

/// A source of periodic domain events.
#[async_trait]
pub trait Producer: Send + Sync + std::fmt::Debug {
    /// Unique name, used by [`BroadcastScheduler::tick`](super::BroadcastScheduler::tick) and in logs.
    fn name(&self) -> &str;

    /// Topic the events are published on; `None` broadcasts to every connection.
    fn topic(&self) -> Option<Topic>;

    /// Time between ticks.
    fn interval(&self) -> Duration;

    /// Produce the next event.
    async fn produce(&self) -> AppResult<Envelope>;
}
