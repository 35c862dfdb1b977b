//! Bounded per-connection outbound queue.
//!
//! Two queue flavours back the two overflow policies:
//!
//! - [`OverflowPolicy::Disconnect`] uses an `mpsc` channel; a full queue is
//!   reported to the caller as [`DeliveryError::Backpressure`] and the hub
//!   drops the connection.
//! - [`OverflowPolicy::DropOldest`] uses a single-receiver `broadcast`
//!   channel, which overwrites the oldest frame when full. The receiver
//!   observes the gap as `Lagged(n)` and carries on with the newest frames.
//!   `broadcast` rounds its ring up to a power of two, so the receiver also
//!   discards any backlog beyond the configured capacity.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use aiengines_core::config::OverflowPolicy;
use aiengines_core::types::ConnectionId;

use crate::metrics::HubMetrics;

/// Why a frame could not be queued for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The connection is closing/closed or its receiver is gone.
    #[error("connection closed")]
    Closed,
    /// The outbound queue is full and the policy is to disconnect.
    #[error("outbound queue full")]
    Backpressure,
}

/// Sending half of a connection's outbound queue.
#[derive(Debug, Clone)]
pub enum OutboundSender {
    /// Bounded queue that rejects when full.
    Queue(mpsc::Sender<String>),
    /// Ring buffer that overwrites the oldest frame when full.
    Ring(broadcast::Sender<String>),
}

/// Receiving half of a connection's outbound queue, drained by the socket writer.
#[derive(Debug)]
pub struct OutboundReceiver {
    conn_id: ConnectionId,
    capacity: usize,
    inner: ReceiverInner,
    metrics: Arc<HubMetrics>,
}

#[derive(Debug)]
enum ReceiverInner {
    Queue(mpsc::Receiver<String>),
    Ring(broadcast::Receiver<String>),
}

/// Creates a bounded outbound queue for `conn_id` honouring `policy`.
pub fn channel(
    conn_id: ConnectionId,
    capacity: usize,
    policy: OverflowPolicy,
    metrics: Arc<HubMetrics>,
) -> (OutboundSender, OutboundReceiver) {
    let capacity = capacity.max(1);
    let (sender, inner) = match policy {
        OverflowPolicy::Disconnect => {
            let (tx, rx) = mpsc::channel(capacity);
            (OutboundSender::Queue(tx), ReceiverInner::Queue(rx))
        }
        OverflowPolicy::DropOldest => {
            let (tx, rx) = broadcast::channel(capacity);
            (OutboundSender::Ring(tx), ReceiverInner::Ring(rx))
        }
    };
    (
        sender,
        OutboundReceiver {
            conn_id,
            capacity,
            inner,
            metrics,
        },
    )
}

impl OutboundSender {
    /// Queues a frame without waiting.
    pub fn try_send(&self, frame: String) -> Result<(), DeliveryError> {
        match self {
            Self::Queue(tx) => tx.try_send(frame).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => DeliveryError::Backpressure,
                mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
            }),
            Self::Ring(tx) => tx.send(frame).map(|_| ()).map_err(|_| DeliveryError::Closed),
        }
    }
}

impl OutboundReceiver {
    /// Waits for the next frame. Returns `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<String> {
        match &mut self.inner {
            ReceiverInner::Queue(rx) => rx.recv().await,
            ReceiverInner::Ring(rx) => loop {
                match rx.recv().await {
                    Ok(frame) => {
                        // `len` excludes the frame just taken.
                        if rx.len() >= self.capacity {
                            self.metrics.messages_dropped(1);
                            continue;
                        }
                        return Some(frame);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            conn_id = %self.conn_id,
                            skipped,
                            "Slow consumer, dropped oldest outbound frames"
                        );
                        self.metrics.messages_dropped(skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            },
        }
    }

    /// Returns an already-queued frame without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        match &mut self.inner {
            ReceiverInner::Queue(rx) => rx.try_recv().ok(),
            ReceiverInner::Ring(rx) => loop {
                match rx.try_recv() {
                    Ok(frame) => {
                        if rx.len() >= self.capacity {
                            self.metrics.messages_dropped(1);
                            continue;
                        }
                        return Some(frame);
                    }
                    Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                        self.metrics.messages_dropped(skipped);
                    }
                    Err(_) => return None,
                }
            },
        }
    }
}
