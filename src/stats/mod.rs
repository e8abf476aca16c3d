//! Hub, session and server statistics

pub mod metrics;

pub use metrics::{HubMetrics, HubStats, ServerStats, SessionStats};
