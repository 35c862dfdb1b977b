//! Top-level real-time engine that ties the hub and scheduler together.

use std::sync::Arc;

use tracing::info;

use aiengines_core::config::RealtimeConfig;

use crate::hub::Hub;
use crate::metrics::HubMetrics;
use crate::scheduler::BroadcastScheduler;

/// Owns the [`Hub`] and the [`BroadcastScheduler`] that feeds it.
#[derive(Debug, Clone)]
pub struct RealtimeEngine {
    /// Connection and subscription hub.
    pub hub: Arc<Hub>,
    /// Periodic producers.
    pub scheduler: Arc<BroadcastScheduler>,
    producers_enabled: bool,
}

impl RealtimeEngine {
    /// Creates the hub and registers the built-in producers.
    pub fn new(config: RealtimeConfig) -> Self {
        let producers_enabled = config.producers.enabled;
        let producer_config = config.producers.clone();
        let hub = Arc::new(Hub::new(config));
        let scheduler = Arc::new(BroadcastScheduler::from_config(hub.clone(), &producer_config));

        info!(
            producers = ?scheduler.producer_names(),
            producers_enabled,
            "Real-time engine initialized"
        );

        Self {
            hub,
            scheduler,
            producers_enabled,
        }
    }

    /// Starts producer timers, unless disabled in configuration.
    pub async fn start(&self) {
        if self.producers_enabled {
            self.scheduler.start().await;
        } else {
            info!("Periodic producers disabled");
        }
    }

    pub fn metrics(&self) -> &Arc<HubMetrics> {
        self.hub.metrics()
    }

    /// Stops the producers first, then closes every connection.
    pub async fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.scheduler.shutdown().await;
        self.hub.shutdown().await;
        info!("Real-time engine shut down");
    }
}
