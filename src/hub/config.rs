//! Hub configuration

/// Hub configuration options
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Depth of the inbound submission queue
    ///
    /// Producers wait only while this queue is full.
    pub inbound_capacity: usize,

    /// Depth of each subscriber's delivery queue
    ///
    /// When a subscriber's queue is full, new frames are dropped for that
    /// subscriber only.
    pub queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            inbound_capacity: 1,
            queue_capacity: 16,
        }
    }
}

impl HubConfig {
    /// Set the inbound queue depth (at least 1)
    pub fn inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = capacity.max(1);
        self
    }

    /// Set the per-subscriber queue depth (at least 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();

        assert_eq!(config.inbound_capacity, 1);
        assert_eq!(config.queue_capacity, 16);
    }

    #[test]
    fn test_builder_capacities() {
        let config = HubConfig::default().inbound_capacity(8).queue_capacity(64);

        assert_eq!(config.inbound_capacity, 8);
        assert_eq!(config.queue_capacity, 64);
    }

    #[test]
    fn test_builder_capacity_clamped() {
        // tokio channels panic on a zero capacity
        let config = HubConfig::default().inbound_capacity(0).queue_capacity(0);

        assert_eq!(config.inbound_capacity, 1);
        assert_eq!(config.queue_capacity, 1);
    }
}
