//! Map event publisher
//!
//! High-level API for putting callsigns, spots and chat messages on the map.

use std::sync::Arc;

use crate::error::Result;
use crate::frame::{Frame, FramePayload};
use crate::hub::Hub;

/// Producer facade over a [`Hub`]
///
/// Each `show_*` call builds a frame stamped with the current time and the
/// hub's listen address, and returns once the hub has accepted it. Delivery
/// to map clients is asynchronous and best-effort.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use dxmap_rs::hub::{Hub, HubConfig};
/// use dxmap_rs::producer::MapPublisher;
///
/// # async fn example() -> dxmap_rs::error::Result<()> {
/// let hub = Arc::new(Hub::spawn(HubConfig::default()));
/// let publisher = MapPublisher::new(hub, "0.0.0.0:12345");
///
/// publisher.show_partial_call("W1AW").await?;
/// publisher.show_logged_call("F5UII", 7012.5).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MapPublisher {
    hub: Arc<Hub>,
    source_addr: String,
}

impl MapPublisher {
    /// Create a publisher stamping frames with `source_addr`
    pub fn new(hub: Arc<Hub>, source_addr: impl Into<String>) -> Self {
        Self {
            hub,
            source_addr: source_addr.into(),
        }
    }

    /// Address stamped into every frame
    pub fn source_addr(&self) -> &str {
        &self.source_addr
    }

    /// Add a logged callsign to the map
    pub async fn show_logged_call(&self, call: impl Into<String>, frequency_khz: f64) -> Result<()> {
        self.publish(FramePayload::LoggedCall {
            call: call.into(),
            frequency_khz,
        })
        .await
    }

    /// Show the position of a (partially) entered callsign
    pub async fn show_partial_call(&self, call: impl Into<String>) -> Result<()> {
        self.publish(FramePayload::PartialCall { call: call.into() })
            .await
    }

    /// Add a DX spot to the map
    pub async fn show_dx_spot(
        &self,
        spot: impl Into<String>,
        spotter: impl Into<String>,
        frequency_khz: f64,
        comments: impl Into<String>,
    ) -> Result<()> {
        self.publish(FramePayload::DxSpot {
            spot: spot.into(),
            spotter: spotter.into(),
            frequency_khz,
            comments: comments.into(),
        })
        .await
    }

    /// Show a gab chat message next to the map
    pub async fn show_gab(
        &self,
        from: impl Into<String>,
        to: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<()> {
        self.publish(FramePayload::Gab {
            from: from.into(),
            to: to.into(),
            message: message.into(),
        })
        .await
    }

    async fn publish(&self, payload: FramePayload) -> Result<()> {
        let frame = Frame::new(payload, self.source_addr.as_str());
        tracing::trace!(kind = %frame.kind(), "Publishing frame");
        self.hub.submit(frame).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::frame::FrameKind;

    const ADDR: &str = "127.0.0.1:12345";

    fn publisher() -> (Arc<Hub>, MapPublisher) {
        let hub = Arc::new(Hub::default());
        let publisher = MapPublisher::new(Arc::clone(&hub), ADDR);
        (hub, publisher)
    }

    #[tokio::test]
    async fn test_partial_call_reaches_every_subscriber() {
        let (hub, publisher) = publisher();
        let mut a = hub.register().await.unwrap();
        let mut b = hub.register().await.unwrap();

        publisher.show_partial_call("W1AW").await.unwrap();

        for sub in [&mut a, &mut b] {
            let frame = sub.recv().await.unwrap();
            assert_eq!(frame.kind(), FrameKind::PartialCall);
            assert_eq!(frame.source_addr(), ADDR);
            assert_eq!(
                frame.payload(),
                &FramePayload::PartialCall {
                    call: "W1AW".into()
                }
            );
        }
    }

    #[tokio::test]
    async fn test_timestamps_do_not_go_backwards() {
        let (hub, publisher) = publisher();
        let mut sub = hub.register().await.unwrap();

        publisher.show_partial_call("F5UII").await.unwrap();
        publisher.show_partial_call("W1AW").await.unwrap();

        let first = sub.recv().await.unwrap();
        let second = sub.recv().await.unwrap();
        assert!(first.date_time() > 0);
        assert!(second.date_time() >= first.date_time());
    }

    #[tokio::test]
    async fn test_all_show_operations() {
        let hub = Arc::new(Hub::spawn(crate::hub::HubConfig::default().queue_capacity(8)));
        let publisher = MapPublisher::new(Arc::clone(&hub), ADDR);
        let mut sub = hub.register().await.unwrap();

        publisher.show_logged_call("F5UII", 7012.5).await.unwrap();
        publisher.show_partial_call("W1").await.unwrap();
        publisher
            .show_dx_spot("ZL2CTM", "DL3NEY", 14025.0, "up 2")
            .await
            .unwrap();
        publisher.show_gab("X", "Y", "hello").await.unwrap();

        let kinds: Vec<FrameKind> = [
            sub.recv().await.unwrap(),
            sub.recv().await.unwrap(),
            sub.recv().await.unwrap(),
            sub.recv().await.unwrap(),
        ]
        .iter()
        .map(|frame| frame.kind())
        .collect();

        assert_eq!(
            kinds,
            vec![
                FrameKind::LoggedCall,
                FrameKind::PartialCall,
                FrameKind::DxSpot,
                FrameKind::Gab
            ]
        );
    }

    #[tokio::test]
    async fn test_gab_scenario_late_subscriber() {
        let (hub, publisher) = publisher();
        let mut a = hub.register().await.unwrap();

        publisher.show_gab("X", "Y", "hello").await.unwrap();
        let mut b = hub.register().await.unwrap();
        publisher.show_gab("X", "Y", "bye").await.unwrap();
        hub.shutdown().await;

        let hello = a.recv().await.unwrap();
        assert!(matches!(
            hello.payload(),
            FramePayload::Gab { message, .. } if message == "hello"
        ));

        let from_a = a.recv().await.unwrap();
        let from_b = b.recv().await.unwrap();
        assert!(Arc::ptr_eq(&from_a, &from_b));
        assert!(matches!(
            from_b.payload(),
            FramePayload::Gab { message, .. } if message == "bye"
        ));
        assert!(b.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_show_after_shutdown_is_rejected() {
        let (hub, publisher) = publisher();
        let mut sub = hub.register().await.unwrap();

        hub.shutdown().await;

        let result = publisher.show_logged_call("W1AW", 14000.0).await;
        assert!(matches!(result, Err(Error::HubClosed)));
        assert!(sub.recv().await.is_none());
    }
}
