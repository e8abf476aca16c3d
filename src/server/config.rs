//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Default listen port of HamDXMap's wtSock connector
pub const DEFAULT_PORT: u16 = 12345;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to, also stamped into every frame as `SourceAddr`
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Websocket upgrade must complete within this time
    pub handshake_timeout: Duration,

    /// Deadline for writing a single frame to a client
    pub write_timeout: Duration,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Drain deadline for `DxMapServer::graceful_shutdown`
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 0, // Unlimited
            handshake_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_millis(100),
            tcp_nodelay: true, // Frames are tiny, don't hold them back
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the per-frame write deadline
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set graceful shutdown deadline
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Disable TCP_NODELAY
    pub fn disable_nodelay(mut self) -> Self {
        self.tcp_nodelay = false;
        self
    }

    /// Text stamped into frames as `SourceAddr`
    pub fn source_addr(&self) -> String {
        self.bind_addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.write_timeout, Duration::from_millis(100));
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:12346".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 12346);
        assert_eq!(config.source_addr(), "127.0.0.1:12346");
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(50)
            .handshake_timeout(Duration::from_secs(5))
            .write_timeout(Duration::from_millis(250))
            .shutdown_timeout(Duration::from_secs(1))
            .disable_nodelay();

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.handshake_timeout, Duration::from_secs(5));
        assert_eq!(config.write_timeout, Duration::from_millis(250));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert!(!config.tcp_nodelay);
    }
}
