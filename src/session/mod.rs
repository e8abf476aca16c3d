//! Subscriber sessions
//!
//! A session pairs one [`Subscription`](crate::hub::Subscription) with one
//! transport. The [`Transmitter`] drains the subscription into a
//! [`FrameSink`] until the hub shuts down or the transport fails.

pub mod sink;
pub mod transmit;

pub use sink::FrameSink;
pub use transmit::{CloseReason, TransmitOutcome, Transmitter};
