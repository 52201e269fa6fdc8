// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote replay service.
//!
//! Provides a trait-based boundary to the dispatch server that enables:
//! - A real WebSocket client for production
//! - Mock services for engine tests
//!
//! The server must tolerate a replay arriving more than once: the engine
//! may crash between a successful push and recording it as synced.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tsync_core::protocol::{ClientMessage, ServerMessage};
use tsync_core::{Action, Checkin, Payload, TripUpdate};

/// Error type for remote operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// The server refused the replay.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The server reported an error not tied to a request.
    #[error("server error: {0}")]
    Server(String),

    /// Malformed or unexpected message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The replay did not finish in time.
    #[error("replay timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by [`RemoteService`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// The dispatch server as seen by the sync engine.
pub trait RemoteService: Send + Sync {
    /// Apply one queued mutation remotely.
    fn push(&self, item_id: String, action: Action, payload: Payload) -> RemoteFuture<'_, ()>;

    /// The server's copy of a passenger's check-in, if any.
    fn fetch_checkin(
        &self,
        trip_id: String,
        passenger_id: String,
    ) -> RemoteFuture<'_, Option<Checkin>>;

    /// The server's copy of a trip, if any.
    fn fetch_trip(&self, trip_id: String) -> RemoteFuture<'_, Option<TripUpdate>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Internal WebSocket connection wrapper.
struct WebSocketConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

/// WebSocket client for the dispatch server using tokio-tungstenite.
///
/// Connects lazily on the first request and reconnects after a broken
/// connection. Requests are serialized over the single connection.
pub struct WebSocketRemote {
    url: String,
    connect_timeout: Duration,
    ws: Mutex<Option<WebSocketConnection>>,
    next_request: AtomicU64,
}

impl WebSocketRemote {
    /// Create a client for the given `ws://` or `wss://` URL.
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        WebSocketRemote {
            url: url.into(),
            connect_timeout,
            ws: Mutex::new(None),
            next_request: AtomicU64::new(1),
        }
    }

    /// The server URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect now instead of on the first request.
    pub async fn connect(&self) -> RemoteResult<()> {
        let mut ws = self.ws.lock().await;
        if ws.is_none() {
            *ws = Some(self.open().await?);
        }
        Ok(())
    }

    /// Close the connection, if any.
    pub async fn disconnect(&self) {
        if let Some(mut conn) = self.ws.lock().await.take() {
            let _ = conn.sink.close().await;
        }
    }

    /// Check if connected.
    pub async fn is_connected(&self) -> bool {
        self.ws.lock().await.is_some()
    }

    async fn open(&self) -> RemoteResult<WebSocketConnection> {
        let connect = tokio_tungstenite::connect_async(self.url.as_str());
        let (ws_stream, _) = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| {
                RemoteError::ConnectionFailed(format!(
                    "timed out after {:?}",
                    self.connect_timeout
                ))
            })?
            .map_err(|e| RemoteError::ConnectionFailed(e.to_string()))?;

        tracing::debug!(url = %self.url, "connected to remote");
        let (sink, stream) = ws_stream.split();
        Ok(WebSocketConnection { sink, stream })
    }

    /// Send one request and wait for the response carrying its id.
    async fn request(
        &self,
        build: impl FnOnce(u64) -> ClientMessage,
    ) -> RemoteResult<ServerMessage> {
        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let msg = build(request_id);
        let json = msg
            .to_json()
            .map_err(|e| RemoteError::Protocol(e.to_string()))?;

        let mut guard = self.ws.lock().await;
        if guard.is_none() {
            *guard = Some(self.open().await?);
        }
        let Some(conn) = guard.as_mut() else {
            return Err(RemoteError::ConnectionClosed);
        };

        let result = exchange(conn, json, request_id).await;
        if matches!(
            result,
            Err(RemoteError::ConnectionClosed) | Err(RemoteError::ConnectionFailed(_))
        ) {
            // Connection is broken, clear it
            *guard = None;
        }
        result
    }
}

async fn exchange(
    conn: &mut WebSocketConnection,
    json: String,
    request_id: u64,
) -> RemoteResult<ServerMessage> {
    conn.sink
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| RemoteError::ConnectionFailed(e.to_string()))?;
    // Flush to detect a broken connection before waiting for a reply
    conn.sink
        .flush()
        .await
        .map_err(|e| RemoteError::ConnectionFailed(e.to_string()))?;

    loop {
        match conn.stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let msg = ServerMessage::from_json(text.as_str())
                    .map_err(|e| RemoteError::Protocol(e.to_string()))?;
                match msg.request_id() {
                    Some(id) if id == request_id => return Ok(msg),
                    Some(id) => {
                        tracing::debug!(id, "dropping response to an abandoned request");
                    }
                    None => {
                        if let ServerMessage::Error { message } = msg {
                            return Err(RemoteError::Server(message));
                        }
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => return Err(RemoteError::ConnectionClosed),
            Some(Ok(_)) => {
                // Ignore ping/pong and binary frames
                continue;
            }
            Some(Err(e)) => return Err(RemoteError::ConnectionFailed(e.to_string())),
        }
    }
}

fn unexpected(msg: &ServerMessage) -> RemoteError {
    RemoteError::Protocol(format!("unexpected response: {:?}", msg))
}

impl RemoteService for WebSocketRemote {
    fn push(&self, item_id: String, action: Action, payload: Payload) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            let response = self
                .request(|id| ClientMessage::replay(id, item_id, action, payload))
                .await?;
            match response {
                ServerMessage::Ack { .. } => Ok(()),
                ServerMessage::Rejected { message, .. } => Err(RemoteError::Rejected(message)),
                other => Err(unexpected(&other)),
            }
        })
    }

    fn fetch_checkin(
        &self,
        trip_id: String,
        passenger_id: String,
    ) -> RemoteFuture<'_, Option<Checkin>> {
        Box::pin(async move {
            let response = self
                .request(|id| ClientMessage::fetch_checkin(id, trip_id, passenger_id))
                .await?;
            match response {
                ServerMessage::Checkin { checkin, .. } => Ok(checkin),
                ServerMessage::Rejected { message, .. } => Err(RemoteError::Rejected(message)),
                other => Err(unexpected(&other)),
            }
        })
    }

    fn fetch_trip(&self, trip_id: String) -> RemoteFuture<'_, Option<TripUpdate>> {
        Box::pin(async move {
            let response = self
                .request(|id| ClientMessage::fetch_trip(id, trip_id))
                .await?;
            match response {
                ServerMessage::Trip { trip, .. } => Ok(trip),
                ServerMessage::Rejected { message, .. } => Err(RemoteError::Rejected(message)),
                other => Err(unexpected(&other)),
            }
        })
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
