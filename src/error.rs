//! Error types
//!
//! A single error enum covers the whole crate. Steady-state delivery problems
//! (full queues, a dead subscriber) never surface here; only the failures a
//! caller can act on do.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use tokio_tungstenite::tungstenite;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for hub, session and server operations
#[derive(Debug)]
pub enum Error {
    /// I/O error on the listener or a connection
    Io(io::Error),
    /// The listener could not be bound
    Bind {
        /// Address we tried to bind
        addr: SocketAddr,
        /// Underlying error
        source: io::Error,
    },
    /// Websocket protocol or transport error
    WebSocket(tungstenite::Error),
    /// A frame could not be encoded as JSON
    Encode(serde_json::Error),
    /// The hub has shut down and no longer accepts frames or subscribers
    HubClosed,
    /// The server has been shut down
    ServerClosed,
    /// `serve` is already running on this server
    AlreadyServing,
    /// The websocket upgrade did not complete in time
    HandshakeTimeout,
    /// A frame could not be written within the write deadline
    WriteTimeout,
    /// Graceful shutdown was cancelled before connections drained
    ShutdownTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Bind { addr, source } => write!(f, "Cannot bind {}: {}", addr, source),
            Error::WebSocket(e) => write!(f, "Websocket error: {}", e),
            Error::Encode(e) => write!(f, "Cannot encode frame: {}", e),
            Error::HubClosed => write!(f, "Hub is closed"),
            Error::ServerClosed => write!(f, "Server is closed"),
            Error::AlreadyServing => write!(f, "Server is already serving"),
            Error::HandshakeTimeout => write!(f, "Websocket handshake timed out"),
            Error::WriteTimeout => write!(f, "Write deadline exceeded"),
            Error::ShutdownTimeout => write!(f, "Graceful shutdown did not finish in time"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Bind { source, .. } => Some(source),
            Error::WebSocket(e) => Some(e),
            Error::Encode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<tungstenite::Error> for Error {
    fn from(e: tungstenite::Error) -> Self {
        Error::WebSocket(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Encode(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_bind_error_display_and_source() {
        let err = Error::Bind {
            addr: "127.0.0.1:12345".parse().unwrap(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "in use"),
        };

        assert_eq!(err.to_string(), "Cannot bind 127.0.0.1:12345: in use");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_hub_closed_has_no_source() {
        assert!(Error::HubClosed.source().is_none());
        assert_eq!(Error::HubClosed.to_string(), "Hub is closed");
    }

    #[test]
    fn test_from_io() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
