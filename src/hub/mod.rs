//! Broadcast hub for frame fan-out
//!
//! The hub receives frames from the producer and replicates them to every
//! registered subscriber. A single coordination task owns the subscriber
//! registry, so membership changes and broadcasts never race.
//!
//! # Architecture
//!
//! ```text
//!    [MapPublisher]                 [Connection]           [Connection]
//!    show_*() ──► submit()          register()             register()
//!                    │                   │                      │
//!                    ▼                   ▼                      │
//!             Event::Frame        Event::Register ◄─────────────┘
//!                    │                   │
//!                    └────────┬──────────┘
//!                             ▼
//!                   inbound (mpsc, ordered)
//!                             │
//!                             ▼
//!                  ┌──────────────────────┐
//!                  │ Coordinator::run     │
//!                  │   registry: Vec<     │
//!                  │     SubscriberSlot>  │
//!                  └──────────┬───────────┘
//!                 try_send    │    try_send
//!            ┌────────────────┼────────────────┐
//!            ▼                ▼                ▼
//!      queue (mpsc)     queue (mpsc)     queue (mpsc)
//!      Transmitter      Transmitter      Transmitter ──► websocket
//! ```
//!
//! # Backpressure
//!
//! Fan-out never waits. If a subscriber's queue is full the frame is dropped
//! for that subscriber and counted in [`HubMetrics`](crate::stats::HubMetrics);
//! everyone else still gets it.

pub mod config;
mod coordinator;
pub mod handle;
pub mod subscription;

pub use config::HubConfig;
pub use handle::Hub;
pub use subscription::{SubscriberId, Subscription};
