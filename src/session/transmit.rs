//! Per-subscriber transmit loop
//!
//! A transmitter drains one subscription into one sink. It is the only
//! place a subscriber can fail, and a failure only ever touches its own
//! queue and transport.

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::error::Error;
use crate::hub::{SubscriberId, Subscription};
use crate::stats::SessionStats;

use super::sink::FrameSink;

/// Why a transmitter stopped
#[derive(Debug)]
pub enum CloseReason {
    /// The hub closed the queue (shutdown)
    HubClosed,
    /// A frame could not be sent; the subscriber terminated itself
    Failed(Error),
}

/// Result of a finished transmit loop
#[derive(Debug)]
pub struct TransmitOutcome {
    /// Subscriber the loop served
    pub subscriber: SubscriberId,
    /// Why the loop ended
    pub reason: CloseReason,
    /// Session statistics
    pub stats: SessionStats,
}

impl TransmitOutcome {
    /// Check whether the loop ended because of a send failure or timeout
    pub fn is_failure(&self) -> bool {
        matches!(self.reason, CloseReason::Failed(_))
    }
}

/// Moves frames from a subscription to a sink
pub struct Transmitter<S: FrameSink> {
    subscription: Subscription,
    sink: S,
    write_timeout: Duration,
}

impl<S: FrameSink> Transmitter<S> {
    /// Create a transmitter; every write is bounded by `write_timeout`
    pub fn new(subscription: Subscription, sink: S, write_timeout: Duration) -> Self {
        Self {
            subscription,
            sink,
            write_timeout,
        }
    }

    /// Subscriber this transmitter serves
    pub fn subscriber(&self) -> SubscriberId {
        self.subscription.id()
    }

    /// Run until the hub closes the queue or a send fails
    ///
    /// A failed or timed-out frame is not retried. The sink is closed before
    /// returning in every case.
    pub async fn run(mut self) -> TransmitOutcome {
        let id = self.subscription.id();
        let started = Instant::now();
        let mut stats = SessionStats::new();

        let reason = loop {
            let Some(frame) = self.subscription.recv().await else {
                break CloseReason::HubClosed;
            };

            match timeout(self.write_timeout, self.sink.send_frame(&frame)).await {
                Ok(Ok(bytes)) => {
                    stats.frames_sent += 1;
                    stats.bytes_sent += bytes as u64;
                }
                Ok(Err(e)) => break CloseReason::Failed(e),
                Err(_) => break CloseReason::Failed(Error::WriteTimeout),
            }
        };

        if let CloseReason::Failed(ref e) = reason {
            self.subscription.close();
            tracing::warn!(
                subscriber = %id,
                error = %e,
                frames_sent = stats.frames_sent,
                "Subscriber terminated"
            );
        }

        match timeout(self.write_timeout, self.sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(subscriber = %id, error = %e, "Close failed"),
            Err(_) => tracing::debug!(subscriber = %id, "Close timed out"),
        }

        stats.duration = started.elapsed();
        tracing::debug!(
            subscriber = %id,
            frames_sent = stats.frames_sent,
            bytes_sent = stats.bytes_sent,
            "Transmitter finished"
        );

        TransmitOutcome {
            subscriber: id,
            reason,
            stats,
        }
    }
}
