//! DXMap server listener
//!
//! Handles the TCP accept loop, spawns connection handlers and sequences
//! shutdown of the listener, the hub and the open connections.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinError, JoinSet};

use crate::error::{Error, Result};
use crate::hub::{Hub, HubConfig};
use crate::producer::MapPublisher;
use crate::server::config::ServerConfig;
use crate::server::connection::serve_connection;
use crate::stats::ServerStats;

/// Server lifecycle phase
///
/// Phases only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Accepting connections and frames
    Running,
    /// Graceful shutdown: listener stopped, connections finishing
    Draining,
    /// Abrupt shutdown: connections are being torn down
    Closing,
}

/// DXMap websocket server
///
/// Owns the hub, exposes the producer operations and serves map clients.
pub struct DxMapServer {
    config: ServerConfig,
    hub: Arc<Hub>,
    publisher: MapPublisher,
    next_session_id: AtomicU64,
    rejected_connections: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
    lifecycle: watch::Sender<Lifecycle>,
    stopped: watch::Sender<bool>,
}

impl DxMapServer {
    /// Create a new server with the given configuration
    ///
    /// The hub starts immediately; frames shown before `serve` is called
    /// simply reach nobody.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_hub_config(config, HubConfig::default())
    }

    /// Create a new server with custom hub configuration
    pub fn with_hub_config(config: ServerConfig, hub_config: HubConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        let hub = Arc::new(Hub::spawn(hub_config));
        let publisher = MapPublisher::new(Arc::clone(&hub), config.source_addr());
        let (lifecycle, _) = watch::channel(Lifecycle::Running);
        let (stopped, _) = watch::channel(true);

        Self {
            config,
            hub,
            publisher,
            next_session_id: AtomicU64::new(1),
            rejected_connections: AtomicU64::new(0),
            connection_semaphore,
            lifecycle,
            stopped,
        }
    }

    /// Get a reference to the hub
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Get the producer facade, e.g. to hand to another task
    pub fn publisher(&self) -> &MapPublisher {
        &self.publisher
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Current lifecycle phase
    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.borrow()
    }

    /// Server-wide statistics
    pub fn stats(&self) -> ServerStats {
        ServerStats {
            total_connections: self.next_session_id.load(Ordering::Relaxed) - 1,
            rejected_connections: self.rejected_connections.load(Ordering::Relaxed),
            hub: self.hub.stats(),
        }
    }

    /// Add a logged callsign to the map
    pub async fn show_logged_call(&self, call: impl Into<String>, frequency_khz: f64) -> Result<()> {
        self.publisher.show_logged_call(call, frequency_khz).await
    }

    /// Show the position of a (partially) entered callsign
    pub async fn show_partial_call(&self, call: impl Into<String>) -> Result<()> {
        self.publisher.show_partial_call(call).await
    }

    /// Add a DX spot to the map
    pub async fn show_dx_spot(
        &self,
        spot: impl Into<String>,
        spotter: impl Into<String>,
        frequency_khz: f64,
        comments: impl Into<String>,
    ) -> Result<()> {
        self.publisher
            .show_dx_spot(spot, spotter, frequency_khz, comments)
            .await
    }

    /// Show a gab chat message next to the map
    pub async fn show_gab(
        &self,
        from: impl Into<String>,
        to: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<()> {
        self.publisher.show_gab(from, to, message).await
    }

    /// Bind the configured address and serve map clients
    ///
    /// Returns `Ok(())` after [`shutdown`](Self::shutdown) or
    /// [`close`](Self::close), or an error if the listener cannot be bound
    /// or fails.
    pub async fn serve(&self) -> Result<()> {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;

        self.serve_on(listener).await
    }

    /// Serve map clients on an already bound listener
    pub async fn serve_on(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;

        let claimed = self.stopped.send_if_modified(|stopped| {
            let was_stopped = *stopped;
            *stopped = false;
            was_stopped
        });
        if !claimed {
            return Err(Error::AlreadyServing);
        }

        let mut lifecycle = self.lifecycle.subscribe();
        if *lifecycle.borrow_and_update() != Lifecycle::Running {
            self.stopped.send_replace(true);
            return Err(Error::ServerClosed);
        }

        tracing::info!(addr = %local_addr, "DXMap server listening");

        let mut connections = JoinSet::new();
        let result = self
            .accept_loop(&listener, &mut connections, &mut lifecycle)
            .await;
        drop(listener);

        if result.is_err() {
            self.lifecycle.send_replace(Lifecycle::Closing);
        }
        let mode = *lifecycle.borrow_and_update();
        self.wind_down(mode, &mut connections, &mut lifecycle).await;

        self.stopped.send_replace(true);
        tracing::info!(addr = %local_addr, "DXMap server stopped");

        result
    }

    /// Gracefully shut down
    ///
    /// Stops the listener, closes the hub (so every connection finishes the
    /// frames it holds and closes its websocket) and waits for connections
    /// to finish. If `cancel` completes first, the remaining connections are
    /// closed abruptly and [`Error::ShutdownTimeout`] is returned.
    pub async fn shutdown<F>(&self, cancel: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let started = self.lifecycle.send_if_modified(|state| {
            if *state == Lifecycle::Running {
                *state = Lifecycle::Draining;
                true
            } else {
                false
            }
        });
        if started {
            tracing::info!("Graceful shutdown started");
        }

        let finished = async {
            self.hub.shutdown().await;
            self.wait_stopped().await;
        };

        tokio::select! {
            _ = finished => Ok(()),
            _ = cancel => {
                tracing::warn!("Graceful shutdown cancelled, closing connections");
                self.close().await;
                Err(Error::ShutdownTimeout)
            }
        }
    }

    /// Gracefully shut down, giving connections `timeout` to finish
    pub async fn shutdown_timeout(&self, timeout: Duration) -> Result<()> {
        self.shutdown(tokio::time::sleep(timeout)).await
    }

    /// Gracefully shut down using the configured shutdown timeout
    pub async fn graceful_shutdown(&self) -> Result<()> {
        self.shutdown_timeout(self.config.shutdown_timeout).await
    }

    /// Close the listener, the hub and every connection immediately
    pub async fn close(&self) {
        self.lifecycle.send_replace(Lifecycle::Closing);
        self.hub.shutdown().await;
        self.wait_stopped().await;
    }

    async fn wait_stopped(&self) {
        let mut stopped = self.stopped.subscribe();
        let _ = stopped.wait_for(|stopped| *stopped).await;
    }

    async fn accept_loop(
        &self,
        listener: &TcpListener,
        connections: &mut JoinSet<()>,
        lifecycle: &mut watch::Receiver<Lifecycle>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                _ = lifecycle.changed() => {
                    tracing::info!("Shutdown signal received");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer_addr)) => {
                        self.handle_connection(connections, socket, peer_addr);
                    }
                    Err(e) if is_transient(&e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Listener failed");
                        return Err(Error::Io(e));
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    log_join(joined);
                }
            }
        }
    }

    fn handle_connection(
        &self,
        connections: &mut JoinSet<()>,
        socket: TcpStream,
        peer_addr: SocketAddr,
    ) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match Arc::clone(sem).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    self.rejected_connections.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(error = %e, "Failed to configure socket");
                return;
            }
        }

        let config = self.config.clone();
        let hub = Arc::clone(&self.hub);

        connections.spawn(async move {
            let _permit = permit;

            if let Err(e) = serve_connection(session_id, socket, peer_addr, config, hub).await {
                tracing::debug!(
                    session_id = session_id,
                    error = %e,
                    "Connection error"
                );
            }

            tracing::debug!(session_id = session_id, "Connection closed");
        });
    }

    async fn wind_down(
        &self,
        mode: Lifecycle,
        connections: &mut JoinSet<()>,
        lifecycle: &mut watch::Receiver<Lifecycle>,
    ) {
        // Closing the hub closes every subscriber queue, which ends each
        // transmitter once it has written what it holds.
        self.hub.shutdown().await;

        if mode != Lifecycle::Draining {
            connections.abort_all();
            while connections.join_next().await.is_some() {}
            return;
        }

        let escalate = lifecycle.wait_for(|state| *state == Lifecycle::Closing);
        tokio::pin!(escalate);
        let mut escalated = false;

        loop {
            tokio::select! {
                joined = connections.join_next() => match joined {
                    Some(joined) => log_join(joined),
                    None => break,
                },
                _ = &mut escalate, if !escalated => {
                    escalated = true;
                    tracing::debug!(remaining = connections.len(), "Aborting connections");
                    connections.abort_all();
                }
            }
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

fn log_join(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!(error = %e, "Connection task panicked");
        }
    }
}
