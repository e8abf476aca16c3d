//! # dxmap-rs
//!
//! Push callsigns, DX spots and gab messages to
//! [HamDXMap](https://dxmap.f5uii.net/) over its wtSock websocket protocol.
//!
//! A [`DxMapServer`] listens for map clients and fans every frame out to all
//! of them. Delivery is best-effort: a slow client misses frames instead of
//! holding anyone else up, and a dead one is dropped.
//!
//! ```no_run
//! use dxmap_rs::{DxMapServer, ServerConfig};
//!
//! # async fn example() -> dxmap_rs::Result<()> {
//! let server = std::sync::Arc::new(DxMapServer::new(ServerConfig::default()));
//!
//! let serving = std::sync::Arc::clone(&server);
//! let task = tokio::spawn(async move { serving.serve().await });
//!
//! server.show_partial_call("W1AW").await?;
//! server.show_dx_spot("ZL2CTM", "DL3NEY", 14025.0, "up 2").await?;
//!
//! server.graceful_shutdown().await?;
//! # let _ = task.await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod frame;
pub mod hub;
pub mod producer;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use frame::{Frame, FrameKind, FramePayload};
pub use hub::{Hub, HubConfig, SubscriberId, Subscription};
pub use producer::MapPublisher;
pub use server::{DxMapServer, Lifecycle, ServerConfig};
pub use session::{FrameSink, Transmitter};
