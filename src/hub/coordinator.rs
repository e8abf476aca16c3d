//! Hub coordination loop
//!
//! The loop is the only owner of the subscriber registry. Frames and
//! registrations share one inbound channel and are handled strictly in the
//! order they were handed off, so the registry needs no lock and a
//! subscriber only ever sees frames submitted after it registered.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};

use crate::frame::Frame;
use crate::stats::HubMetrics;

use super::subscription::SubscriberSlot;

/// Request to add a subscriber, acknowledged once it is in the registry
pub(super) struct Registration {
    pub(super) slot: SubscriberSlot,
    pub(super) ack: oneshot::Sender<()>,
}

/// Work handed to the hub loop
pub(super) enum Event {
    Frame(Arc<Frame>),
    Register(Registration),
}

/// Channel ends and shared state owned by the loop
pub(super) struct Coordinator {
    pub(super) inbound: mpsc::Receiver<Event>,
    pub(super) shutdown: watch::Receiver<bool>,
    pub(super) done: watch::Sender<bool>,
    pub(super) metrics: Arc<HubMetrics>,
}

impl Coordinator {
    /// Run until shutdown is signalled or every hub handle is dropped
    pub(super) async fn run(self) {
        let Coordinator {
            mut inbound,
            mut shutdown,
            done,
            metrics,
        } = self;
        let mut registry: Vec<SubscriberSlot> = Vec::new();

        loop {
            tokio::select! {
                biased;

                _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => break,

                event = inbound.recv() => match event {
                    Some(Event::Frame(frame)) => fan_out(&metrics, &mut registry, frame),
                    Some(Event::Register(registration)) => {
                        register(&metrics, &mut registry, registration)
                    }
                    None => break,
                },
            }
        }

        // Frames already handed off were accepted; fan them out before
        // closing. Pending registrations are refused: dropping the ack makes
        // `register` fail with `HubClosed`.
        inbound.close();
        while let Ok(event) = inbound.try_recv() {
            if let Event::Frame(frame) = event {
                fan_out(&metrics, &mut registry, frame);
            }
        }

        // Dropping the senders closes every queue, which is the signal each
        // transmitter waits for.
        let closed = registry.len();
        registry.clear();
        metrics.subscribers_removed(closed as u64);
        done.send_replace(true);

        tracing::info!(subscribers = closed, "Hub stopped");
    }
}

fn register(metrics: &HubMetrics, registry: &mut Vec<SubscriberSlot>, registration: Registration) {
    let id = registration.slot.id;
    registry.push(registration.slot);
    metrics.subscriber_registered();

    // The caller may have given up waiting; its queue is then closed and
    // gets pruned on the next broadcast.
    let _ = registration.ack.send(());

    tracing::debug!(
        subscriber = %id,
        subscribers = registry.len(),
        "Subscriber registered"
    );
}

fn fan_out(metrics: &HubMetrics, registry: &mut Vec<SubscriberSlot>, frame: Arc<Frame>) {
    let mut enqueued = 0u64;
    let mut dropped = 0u64;
    let before = registry.len();

    registry.retain(|slot| match slot.queue.try_send(Arc::clone(&frame)) {
        Ok(()) => {
            enqueued += 1;
            true
        }
        Err(TrySendError::Full(_)) => {
            dropped += 1;
            tracing::debug!(
                subscriber = %slot.id,
                kind = %frame.kind(),
                "Frame dropped, queue full"
            );
            true
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(subscriber = %slot.id, "Subscriber gone, removing");
            false
        }
    });

    let removed = before - registry.len();
    if removed > 0 {
        metrics.subscribers_removed(removed as u64);
    }
    metrics.frame_broadcast(enqueued, dropped);
}
