//! Subscriber identity and delivery queue
//!
//! The hub loop holds the sending half of every queue; the subscriber owns
//! the receiving half. Dropping or closing the receiver is how a subscriber
//! marks itself terminated, and dropping the sender is how the hub tells a
//! subscriber to stop.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::frame::Frame;

/// Unique identifier of a subscriber, assigned in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hub-side entry in the subscriber registry
pub(super) struct SubscriberSlot {
    pub(super) id: SubscriberId,
    pub(super) queue: mpsc::Sender<Arc<Frame>>,
}

/// Receiving end of a registered subscriber
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    queue: mpsc::Receiver<Arc<Frame>>,
}

impl Subscription {
    pub(super) fn new(id: SubscriberId, queue: mpsc::Receiver<Arc<Frame>>) -> Self {
        Self { id, queue }
    }

    /// Identifier assigned by the hub
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next frame
    ///
    /// Returns `None` once the hub has closed this queue (or the subscriber
    /// closed it itself) and every frame already queued has been taken.
    pub async fn recv(&mut self) -> Option<Arc<Frame>> {
        self.queue.recv().await
    }

    /// Take the next frame without waiting
    pub fn try_recv(&mut self) -> Result<Arc<Frame>, TryRecvError> {
        self.queue.try_recv()
    }

    /// Mark this subscriber terminated
    ///
    /// The hub stops delivering to it and drops it from the registry on the
    /// next broadcast. Frames already queued can still be drained.
    pub fn close(&mut self) {
        self.queue.close();
    }
}
