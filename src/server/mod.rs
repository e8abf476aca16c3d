//! Websocket server for map clients
//!
//! Accepts TCP connections, upgrades them to websockets and attaches each
//! one to the hub as a subscriber. Also owns shutdown sequencing: listener
//! first, then the hub, then the connections.

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use connection::WebSocketSink;
pub use listener::{DxMapServer, Lifecycle};
