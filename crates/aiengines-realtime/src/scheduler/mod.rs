//! Periodic broadcast scheduling.
//!
//! Each [`Producer`] gets its own task and timer. All tasks share one
//! [`CancellationToken`], so [`BroadcastScheduler::shutdown`] stops the whole
//! group at once and waits for every task to finish.

pub mod producer;
pub mod producers;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use aiengines_core::config::ProducerConfig;
use aiengines_core::{AppError, AppResult};

use crate::hub::Hub;

pub use producer::Producer;
pub use producers::{AgentStatusProducer, TaskProgressProducer};

/// Runs periodic producers and fans their events out through the [`Hub`].
#[derive(Debug)]
pub struct BroadcastScheduler {
    hub: Arc<Hub>,
    producers: Vec<Arc<dyn Producer>>,
    cancel: CancellationToken,
    started: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl BroadcastScheduler {
    /// Creates a scheduler with no producers.
    pub fn new(hub: Arc<Hub>) -> Self {
        Self {
            hub,
            producers: Vec::new(),
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Creates a scheduler with the built-in agent and task producers.
    pub fn from_config(hub: Arc<Hub>, config: &ProducerConfig) -> Self {
        Self::new(hub)
            .with_producer(Arc::new(AgentStatusProducer::new(config.agent_status_interval())))
            .with_producer(Arc::new(TaskProgressProducer::new(config.task_progress_interval())))
    }

    /// Adds a producer. Must be called before [`start`](Self::start).
    pub fn with_producer(mut self, producer: Arc<dyn Producer>) -> Self {
        self.producers.push(producer);
        self
    }

    /// Names of the registered producers.
    pub fn producer_names(&self) -> Vec<&str> {
        self.producers.iter().map(|p| p.name()).collect()
    }

    /// Whether timers are running.
    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst) && !self.cancel.is_cancelled()
    }

    /// Spawns one timer task per producer. Calling it again is a no-op.
    pub async fn start(&self) {
        if self.cancel.is_cancelled() || self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut tasks = self.tasks.lock().await;
        for producer in &self.producers {
            let period = producer.interval();
            if period.is_zero() {
                warn!(producer = producer.name(), "Zero interval, producer not started");
                continue;
            }

            info!(
                producer = producer.name(),
                interval_ms = period.as_millis() as u64,
                "Producer started"
            );

            let hub = self.hub.clone();
            let producer = producer.clone();
            let cancel = self.cancel.clone();
            tasks.push(tokio::spawn(async move {
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            run_once(&hub, producer.as_ref(), &cancel).await;
                        }
                    }
                }
                debug!(producer = producer.name(), "Producer loop stopped");
            }));
        }
    }

    /// Runs one producer immediately. Returns the number of recipients.
    pub async fn tick(&self, name: &str) -> AppResult<usize> {
        let producer = self
            .producers
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| AppError::not_found(format!("Unknown producer '{name}'")))?;
        Ok(run_once(&self.hub, producer.as_ref(), &self.cancel).await)
    }

    /// Runs every producer once, in registration order.
    pub async fn tick_all(&self) -> usize {
        let mut delivered = 0;
        for producer in &self.producers {
            delivered += run_once(&self.hub, producer.as_ref(), &self.cancel).await;
        }
        delivered
    }

    /// Cancels every producer task and waits for them to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock().await);
        let count = tasks.len();
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Producer task ended abnormally");
            }
        }
        info!(tasks = count, "Broadcast scheduler stopped");
    }
}

/// One producer tick: produce, then publish. Failures are logged and counted.
async fn run_once(hub: &Hub, producer: &dyn Producer, cancel: &CancellationToken) -> usize {
    if cancel.is_cancelled() || hub.is_closed() {
        return 0;
    }

    let envelope = match AssertUnwindSafe(producer.produce()).catch_unwind().await {
        Ok(Ok(envelope)) => envelope,
        Ok(Err(e)) => {
            warn!(producer = producer.name(), error = %e, "Producer failed");
            hub.metrics().producer_failed();
            return 0;
        }
        Err(_) => {
            error!(producer = producer.name(), "Producer panicked");
            hub.metrics().producer_failed();
            return 0;
        }
    };

    if cancel.is_cancelled() {
        return 0;
    }

    let delivered = match producer.topic() {
        Some(topic) => hub.publish(topic, &envelope).await,
        None => hub.broadcast(&envelope).await,
    };
    debug!(producer = producer.name(), kind = %envelope.kind, delivered, "Producer tick");
    delivered
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::message::Envelope;
    use crate::topic::Topic;
    use aiengines_core::config::RealtimeConfig;
    use aiengines_core::types::UserId;

    #[derive(Debug, Default)]
    struct Flaky {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Producer for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn topic(&self) -> Option<Topic> {
            None
        }

        fn interval(&self) -> Duration {
            Duration::from_secs(1)
        }

        async fn produce(&self) -> AppResult<Envelope> {
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err(AppError::internal("upstream unavailable")),
                1 => panic!("producer bug"),
                n => Ok(Envelope::new("flaky", json!({ "n": n }))),
            }
        }
    }

    fn hub() -> Arc<Hub> {
        Arc::new(Hub::new(RealtimeConfig::default()))
    }

    #[tokio::test]
    async fn test_tick_publishes_to_subscribers_only() {
        let hub = hub();
        let scheduler = BroadcastScheduler::from_config(hub.clone(), &ProducerConfig::default());
        let (a, mut rx_a) = hub.register(UserId::from("u1")).await.unwrap();
        let (_b, mut rx_b) = hub.register(UserId::from("u2")).await.unwrap();
        hub.subscribe(&a.id, Topic::AgentUpdates).await;

        assert_eq!(scheduler.tick(AgentStatusProducer::NAME).await.unwrap(), 1);
        assert_eq!(scheduler.tick(TaskProgressProducer::NAME).await.unwrap(), 0);
        assert!(rx_a.try_recv().unwrap().contains("agent_status_update"));
        assert!(rx_b.try_recv().is_none());
        assert!(scheduler.tick("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let hub = hub();
        let scheduler = BroadcastScheduler::new(hub.clone()).with_producer(Arc::new(Flaky::default()));
        let (_conn, mut rx) = hub.register(UserId::from("u1")).await.unwrap();

        assert_eq!(scheduler.tick("flaky").await.unwrap(), 0);
        assert_eq!(scheduler.tick("flaky").await.unwrap(), 0);
        assert_eq!(scheduler.tick("flaky").await.unwrap(), 1);
        assert!(rx.try_recv().is_some());
        assert_eq!(hub.metrics().snapshot().producer_errors, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_fire_until_shutdown() {
        let hub = hub();
        let config = ProducerConfig {
            enabled: true,
            agent_status_interval_seconds: 10,
            task_progress_interval_seconds: 5,
        };
        let scheduler = BroadcastScheduler::from_config(hub.clone(), &config);
        let (conn, mut rx) = hub.register(UserId::from("u1")).await.unwrap();
        hub.subscribe(&conn.id, Topic::TaskUpdates).await;

        scheduler.start().await;
        assert!(scheduler.is_running());

        time::sleep(Duration::from_millis(10_500)).await;
        let mut received = 0;
        while rx.try_recv().is_some() {
            received += 1;
        }
        assert_eq!(received, 2);

        scheduler.shutdown().await;
        assert!(!scheduler.is_running());

        time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_none());
        assert_eq!(scheduler.tick_all().await, 0);
    }
}
