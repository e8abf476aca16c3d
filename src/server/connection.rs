//! Websocket connection handling
//!
//! Upgrades an accepted TCP stream, registers it with the hub and runs its
//! transmitter. Map clients don't send anything meaningful; incoming
//! messages are read only so that a client-side close is noticed.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use crate::error::{Error, Result};
use crate::frame::{codec, Frame};
use crate::hub::Hub;
use crate::server::config::ServerConfig;
use crate::session::{FrameSink, Transmitter};

/// [`FrameSink`] writing each frame as one JSON text message
pub struct WebSocketSink<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
}

impl<S> WebSocketSink<S> {
    pub fn new(sink: SplitSink<WebSocketStream<S>, Message>) -> Self {
        Self { sink }
    }
}

impl<S> FrameSink for WebSocketSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_frame(&mut self, frame: &Frame) -> Result<usize> {
        let text = codec::encode(frame)?;
        let len = text.len();
        self.sink.send(Message::Text(text)).await?;
        Ok(len)
    }

    async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }
}

/// Serve one accepted connection until it or the hub goes away
pub(super) async fn serve_connection(
    session_id: u64,
    socket: TcpStream,
    peer_addr: SocketAddr,
    config: ServerConfig,
    hub: Arc<Hub>,
) -> Result<()> {
    let mut ws = match timeout(config.handshake_timeout, accept_async(socket)).await {
        Ok(ws) => ws?,
        Err(_) => return Err(Error::HandshakeTimeout),
    };

    let subscription = match hub.register().await {
        Ok(subscription) => subscription,
        Err(e) => {
            // Hub already closed: say goodbye like every other connection.
            let _ = timeout(config.write_timeout, ws.close(None)).await;
            return Err(e);
        }
    };
    tracing::debug!(
        session_id = session_id,
        peer = %peer_addr,
        subscriber = %subscription.id(),
        "Client subscribed"
    );

    let (sink, stream) = ws.split();
    let transmitter = Transmitter::new(
        subscription,
        WebSocketSink::new(sink),
        config.write_timeout,
    );

    tokio::select! {
        outcome = transmitter.run() => {
            if outcome.is_failure() {
                hub.metrics().subscriber_failed();
            }
            tracing::debug!(
                session_id = session_id,
                subscriber = %outcome.subscriber,
                reason = ?outcome.reason,
                frames_sent = outcome.stats.frames_sent,
                "Transmitter stopped"
            );
        }
        _ = drain_incoming(stream) => {
            tracing::debug!(session_id = session_id, "Client closed connection");
        }
    }

    Ok(())
}

async fn drain_incoming<S>(mut stream: SplitStream<WebSocketStream<S>>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Read failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;
    use tokio_tungstenite::connect_async;

    use super::*;

    #[tokio::test]
    async fn test_late_handshake_after_hub_shutdown_gets_close_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hub = Arc::new(Hub::default());
        hub.shutdown().await;

        let serving = Arc::clone(&hub);
        let task = tokio::spawn(async move {
            let (socket, peer_addr) = listener.accept().await.unwrap();
            serve_connection(1, socket, peer_addr, ServerConfig::with_addr(addr), serving).await
        });

        let (mut client, _) = connect_async(format!("ws://{}/", addr)).await.unwrap();
        let message = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .unwrap();
        assert!(matches!(message, Some(Ok(Message::Close(_)))));

        let result = task.await.unwrap();
        assert!(matches!(result, Err(Error::HubClosed)));
    }
}
