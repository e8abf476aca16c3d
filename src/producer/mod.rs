//! Producer side of the hub
//!
//! Turns "show this on the map" calls into frames and hands them to the hub.

pub mod publisher;

pub use publisher::MapPublisher;
