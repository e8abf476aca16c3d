//! Public handle to the broadcast hub

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::stats::{HubMetrics, HubStats};

use super::config::HubConfig;
use super::coordinator::{Coordinator, Event, Registration};
use super::subscription::{SubscriberId, SubscriberSlot, Subscription};

/// Broadcast hub
///
/// Cheap to share via `Arc`. All registry state lives in the coordination
/// task spawned by [`Hub::spawn`]; this handle only owns channel ends.
pub struct Hub {
    inbound: mpsc::Sender<Event>,
    shutdown: watch::Sender<bool>,
    done: watch::Receiver<bool>,
    metrics: Arc<HubMetrics>,
    next_subscriber_id: AtomicU64,
    config: HubConfig,
}

impl Hub {
    /// Start a hub on the current tokio runtime
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(config: HubConfig) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (done_tx, done_rx) = watch::channel(false);
        let metrics = Arc::new(HubMetrics::new());

        let coordinator = Coordinator {
            inbound: inbound_rx,
            shutdown: shutdown_rx,
            done: done_tx,
            metrics: Arc::clone(&metrics),
        };
        tokio::spawn(coordinator.run());

        Self {
            inbound: inbound_tx,
            shutdown: shutdown_tx,
            done: done_rx,
            metrics,
            next_subscriber_id: AtomicU64::new(1),
            config,
        }
    }

    /// Get the hub configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Hand a frame to the hub for broadcast
    ///
    /// Waits only while the inbound queue is full. Delivery to subscribers
    /// happens later and is best-effort.
    pub async fn submit(&self, frame: Frame) -> Result<()> {
        if self.is_closed() {
            return Err(Error::HubClosed);
        }

        self.inbound
            .send(Event::Frame(Arc::new(frame)))
            .await
            .map_err(|_| Error::HubClosed)?;
        self.metrics.frame_submitted();

        Ok(())
    }

    /// Register a new subscriber
    ///
    /// Registrations queue behind frames already handed off, so the new
    /// subscription is offered exactly the frames submitted after this call
    /// starts. Returns once the subscriber is in the registry.
    pub async fn register(&self) -> Result<Subscription> {
        if self.is_closed() {
            return Err(Error::HubClosed);
        }

        let id = SubscriberId(self.next_subscriber_id.fetch_add(1, Ordering::Relaxed));
        let (queue_tx, queue_rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let (ack_tx, ack_rx) = oneshot::channel();

        let registration = Registration {
            slot: SubscriberSlot {
                id,
                queue: queue_tx,
            },
            ack: ack_tx,
        };

        self.inbound
            .send(Event::Register(registration))
            .await
            .map_err(|_| Error::HubClosed)?;
        ack_rx.await.map_err(|_| Error::HubClosed)?;

        Ok(Subscription::new(id, queue_rx))
    }

    /// Stop accepting frames and close every subscriber queue
    ///
    /// Returns once the hub loop has closed all queues. Calling it again is
    /// a no-op.
    pub async fn shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            tracing::debug!("Hub shutdown requested");
        }

        let mut done = self.done.clone();
        // An error means the loop is gone, which is just as final.
        let _ = done.wait_for(|finished| *finished).await;
    }

    /// Check whether shutdown has been requested
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Live counters
    pub fn metrics(&self) -> &Arc<HubMetrics> {
        &self.metrics
    }

    /// Point-in-time statistics
    pub fn stats(&self) -> HubStats {
        self.metrics.snapshot()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::spawn(HubConfig::default())
    }
}
