//! Statistics and metrics for the hub and its sessions

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters updated by the hub loop, producers and sessions
///
/// Delivery failures are invisible to producers; these counters are the
/// place to look when a map client stops updating.
#[derive(Debug, Default)]
pub struct HubMetrics {
    frames_submitted: AtomicU64,
    frames_broadcast: AtomicU64,
    frames_enqueued: AtomicU64,
    frames_dropped: AtomicU64,
    subscribers_registered: AtomicU64,
    subscribers_active: AtomicU64,
    subscribers_failed: AtomicU64,
}

impl HubMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn frame_submitted(&self) {
        self.frames_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_broadcast(&self, enqueued: u64, dropped: u64) {
        self.frames_broadcast.fetch_add(1, Ordering::Relaxed);
        self.frames_enqueued.fetch_add(enqueued, Ordering::Relaxed);
        self.frames_dropped.fetch_add(dropped, Ordering::Relaxed);
    }

    pub(crate) fn subscriber_registered(&self) {
        self.subscribers_registered.fetch_add(1, Ordering::Relaxed);
        self.subscribers_active.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn subscribers_removed(&self, count: u64) {
        self.subscribers_active.fetch_sub(count, Ordering::Relaxed);
    }

    pub(crate) fn subscriber_failed(&self) {
        self.subscribers_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters
    pub fn snapshot(&self) -> HubStats {
        HubStats {
            frames_submitted: self.frames_submitted.load(Ordering::Relaxed),
            frames_broadcast: self.frames_broadcast.load(Ordering::Relaxed),
            frames_enqueued: self.frames_enqueued.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            subscribers_registered: self.subscribers_registered.load(Ordering::Relaxed),
            subscribers_active: self.subscribers_active.load(Ordering::Relaxed),
            subscribers_failed: self.subscribers_failed.load(Ordering::Relaxed),
        }
    }
}

/// Hub-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Frames accepted into the inbound queue
    pub frames_submitted: u64,
    /// Frames the hub loop has fanned out
    pub frames_broadcast: u64,
    /// Per-subscriber enqueues that succeeded
    pub frames_enqueued: u64,
    /// Per-subscriber enqueues dropped because the queue was full
    pub frames_dropped: u64,
    /// Subscribers ever registered
    pub subscribers_registered: u64,
    /// Subscribers currently in the registry
    pub subscribers_active: u64,
    /// Subscribers that terminated on a send error or write timeout
    pub subscribers_failed: u64,
}

/// Per-session statistics collected by a transmitter
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Frames written to the transport
    pub frames_sent: u64,
    /// Bytes written to the transport
    pub bytes_sent: u64,
    /// Session duration
    pub duration: Duration,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Average frames per second over the session
    pub fn frame_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.frames_sent as f64 / secs
        } else {
            0.0
        }
    }
}

/// Server-wide statistics
#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    /// Total connections ever accepted
    pub total_connections: u64,
    /// Connections refused because of the connection limit
    pub rejected_connections: u64,
    /// Hub counters
    pub hub: HubStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_metrics_new() {
        let stats = HubMetrics::new().snapshot();
        assert_eq!(stats, HubStats::default());
    }

    #[test]
    fn test_hub_metrics_counting() {
        let metrics = HubMetrics::new();

        metrics.frame_submitted();
        metrics.frame_submitted();
        metrics.frame_broadcast(3, 1);
        metrics.subscriber_registered();
        metrics.subscriber_registered();
        metrics.subscribers_removed(1);
        metrics.subscriber_failed();

        let stats = metrics.snapshot();
        assert_eq!(stats.frames_submitted, 2);
        assert_eq!(stats.frames_broadcast, 1);
        assert_eq!(stats.frames_enqueued, 3);
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.subscribers_registered, 2);
        assert_eq!(stats.subscribers_active, 1);
        assert_eq!(stats.subscribers_failed, 1);
    }

    #[test]
    fn test_session_stats_frame_rate() {
        let mut stats = SessionStats::new();
        stats.frames_sent = 50;
        stats.duration = Duration::from_secs(10);

        assert_eq!(stats.frame_rate(), 5.0);
    }

    #[test]
    fn test_session_stats_frame_rate_zero_duration() {
        let mut stats = SessionStats::new();
        stats.frames_sent = 50;

        assert_eq!(stats.frame_rate(), 0.0);
    }
}
