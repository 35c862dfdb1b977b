//! Built-in producers feeding the dashboard's agent and task panels.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use aiengines_core::AppResult;

use super::producer::Producer;
use crate::message::builder;
use crate::message::types::{AgentPerformance, AgentStatusPayload, TaskLogEntry, TaskProgressPayload};
use crate::message::Envelope;
use crate::topic::Topic;

/// Emits `agent_status_update` on `agent_updates`.
#[derive(Debug, Clone)]
pub struct AgentStatusProducer {
    interval: Duration,
}

impl AgentStatusProducer {
    pub const NAME: &'static str = "agent_status";

    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    fn sample() -> AgentStatusPayload {
        let mut rng = rand::thread_rng();
        AgentStatusPayload {
            agent_id: "1".to_string(),
            status: "active".to_string(),
            performance: AgentPerformance {
                tasks_completed: rng.gen_range(0..100),
                success_rate: 0.9 + rng.gen_range(0.0..0.1),
                uptime: 0.95 + rng.gen_range(0.0..0.05),
            },
        }
    }
}

#[async_trait]
impl Producer for AgentStatusProducer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn topic(&self) -> Option<Topic> {
        Some(Topic::AgentUpdates)
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn produce(&self) -> AppResult<Envelope> {
        builder::agent_status_update(&Self::sample())
    }
}

/// Emits `task_progress_update` on `task_updates`.
#[derive(Debug, Clone)]
pub struct TaskProgressProducer {
    interval: Duration,
}

impl TaskProgressProducer {
    pub const NAME: &'static str = "task_progress";

    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    fn sample() -> TaskProgressPayload {
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        let status = if rng.gen_bool(0.5) { "running" } else { "completed" };
        TaskProgressPayload {
            task_id: "1".to_string(),
            progress: rng.gen_range(0..100),
            status: status.to_string(),
            logs: vec![TaskLogEntry {
                id: now.timestamp_millis().to_string(),
                timestamp: now,
                level: "info".to_string(),
                message: "Task progress updated...".to_string(),
            }],
        }
    }
}

#[async_trait]
impl Producer for TaskProgressProducer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn topic(&self) -> Option<Topic> {
        Some(Topic::TaskUpdates)
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn produce(&self) -> AppResult<Envelope> {
        builder::task_progress_update(&Self::sample())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_agent_status_values_in_range() {
        let producer = AgentStatusProducer::new(Duration::from_secs(10));
        for _ in 0..50 {
            let env = producer.produce().await.unwrap();
            assert_eq!(env.kind, "agent_status_update");
            assert_eq!(env.data["agentId"], "1");
            let perf = &env.data["performance"];
            assert!(perf["tasksCompleted"].as_u64().unwrap() < 100);
            let rate = perf["successRate"].as_f64().unwrap();
            assert!((0.9..=1.0).contains(&rate));
            let uptime = perf["uptime"].as_f64().unwrap();
            assert!((0.95..=1.0).contains(&uptime));
        }
    }

    #[tokio::test]
    async fn test_task_progress_shape() {
        let producer = TaskProgressProducer::new(Duration::from_secs(5));
        let env = producer.produce().await.unwrap();
        assert_eq!(env.kind, "task_progress_update");
        assert!(env.data["progress"].as_u64().unwrap() < 100);
        let status = env.data["status"].as_str().unwrap();
        assert!(status == "running" || status == "completed");

        let logs = env.data["logs"].as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["level"], "info");
        assert!(logs[0]["id"].is_string());
        assert!(logs[0]["timestamp"].is_string());
    }
}
