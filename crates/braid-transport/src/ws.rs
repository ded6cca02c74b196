//! Gateway WebSocket connection.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use braid_core::BraidError;
use braid_core::error::Result;
use braid_core::protocol::{OutboundQuery, ProtocolEvent};

use crate::sink::MessageSink;
use crate::status::ConnectionStatus;

/// Capacity of the inbound channel between the reader task and the client
/// event loop.
const INBOUND_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the outbound channel between the sink and the writer task.
const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An inbound protocol event with its receipt timestamp.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub event: ProtocolEvent,
    /// RFC 3339 receipt time, for display and logs.
    pub received_at: String,
}

/// Handle to a live gateway connection.
///
/// Events arrive on the channel returned by [`connect`], in arrival order.
/// Dropping the handle (or calling [`WsTransport::close`]) cancels both
/// socket tasks; no further events are delivered afterwards.
pub struct WsTransport {
    outbound: mpsc::Sender<OutboundQuery>,
    status_tx: Arc<watch::Sender<ConnectionStatus>>,
    status_rx: watch::Receiver<ConnectionStatus>,
    cancel: CancellationToken,
}

/// Connects to the gateway and splits the socket into reader/writer tasks.
///
/// Returns the transport handle and the inbound event channel.
///
/// # Errors
///
/// Returns [`BraidError::Transport`] when the connection cannot be
/// established. There is no retry here; reconnection policy is the caller's
/// decision.
pub async fn connect(endpoint: &str) -> Result<(WsTransport, mpsc::Receiver<InboundEvent>)> {
    let (socket, _) = connect_async(endpoint)
        .await
        .map_err(|e| BraidError::transport(format!("connect to {endpoint} failed: {e}")))?;
    info!(%endpoint, "gateway connected");

    let (write_half, read_half) = socket.split();
    let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connected);
    let status_tx = Arc::new(status_tx);
    let (event_tx, event_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();

    spawn_reader(read_half, event_tx, status_tx.clone(), cancel.clone());
    spawn_writer(write_half, outbound_rx, status_tx.clone(), cancel.clone());

    Ok((
        WsTransport {
            outbound: outbound_tx,
            status_tx,
            status_rx,
            cancel,
        },
        event_rx,
    ))
}

impl WsTransport {
    /// Subscribes to connection status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Tears the connection down. Both socket tasks stop and no further
    /// events are delivered; an in-flight send is fire-and-forget.
    pub fn close(&self) {
        self.cancel.cancel();
        let _ = self.status_tx.send(ConnectionStatus::Closed);
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl MessageSink for WsTransport {
    async fn send(&self, payload: OutboundQuery) -> Result<()> {
        if !self.status().is_connected() {
            return Err(BraidError::NotConnected);
        }
        self.outbound
            .send(payload)
            .await
            .map_err(|_| BraidError::transport("writer task is gone"))
    }

    fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }
}

/// Spawns the task that decodes inbound frames into protocol events.
fn spawn_reader(
    mut read_half: SplitStream<WsStream>,
    tx: mpsc::Sender<InboundEvent>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = read_half.next() => next,
            };

            let msg = match next {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    warn!(error = %e, "socket error");
                    let _ = status.send(ConnectionStatus::Error);
                    break;
                }
                None => {
                    let _ = status.send(ConnectionStatus::Closed);
                    break;
                }
            };

            let event = match msg {
                WsMessage::Text(payload) => decode_frame(payload.as_bytes()),
                WsMessage::Binary(payload) => decode_frame(&payload),
                WsMessage::Close(_) => {
                    info!("gateway sent close frame");
                    let _ = status.send(ConnectionStatus::Closed);
                    break;
                }
                // Ping/pong are answered by the library.
                _ => continue,
            };

            let Some(event) = event else { continue };
            debug!(?event, "inbound event");
            let inbound = InboundEvent {
                event,
                received_at: chrono::Utc::now().to_rfc3339(),
            };
            if tx.send(inbound).await.is_err() {
                // Receiver dropped; the client loop exited.
                break;
            }
        }
    });
}

/// Spawns the task that encodes outbound queries as text frames.
fn spawn_writer(
    mut write_half: SplitSink<WsStream, WsMessage>,
    mut rx: mpsc::Receiver<OutboundQuery>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            let payload = tokio::select! {
                _ = cancel.cancelled() => break,
                payload = rx.recv() => match payload {
                    Some(payload) => payload,
                    None => break,
                },
            };

            let json = match serde_json::to_string(&payload) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to encode outbound query");
                    continue;
                }
            };

            if write_half.send(WsMessage::Text(json.into())).await.is_err() {
                let _ = status.send(ConnectionStatus::Error);
                break;
            }
        }
    });
}

/// Decodes one frame payload into a protocol event.
///
/// Malformed JSON is skipped with a diagnostic, never surfaced as an error.
fn decode_frame(payload: &[u8]) -> Option<ProtocolEvent> {
    match serde_json::from_slice::<Value>(payload) {
        Ok(value) => Some(ProtocolEvent::decode(value)),
        Err(e) => {
            warn!(error = %e, "skipping malformed frame");
            None
        }
    }
}
