//! Channel Session
//!
//! Owns one live duplex connection to a single room. The session runs on its
//! own task and reports `Opened`, `Closed` and normalized inbound messages to
//! its owner through an unbounded channel, in the order the transport
//! delivered them.
//!
//! Sends are fire-and-forget: `send` on a session that is not open is a
//! no-op that returns `false`. The session never reconnects by itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::client::config::Config;
use crate::shared::error::SyncError;
use crate::shared::event::ChannelEvent;
use crate::shared::message::{Message, MessageOrigin, OutboundFrame, RawInboundMessage};
use crate::shared::room::RoomId;

/// A connected text transport
#[async_trait]
pub trait Transport: Send + 'static {
    async fn send_text(&mut self, text: String) -> Result<(), SyncError>;

    /// Next text frame; `None` once the peer closed the connection
    async fn recv_text(&mut self) -> Option<Result<String, SyncError>>;

    async fn close(&mut self);
}

/// Opens transports scoped to a room
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    async fn connect(&self, room: &RoomId) -> Result<Self::Transport, SyncError>;
}

/// What a room view needs from its channel
///
/// Implemented by [`ChannelSession`]; tests substitute a recording sink.
pub trait ChannelSink: Send {
    /// Fire-and-forget send; returns whether the frame was handed to an open connection
    fn send(&self, frame: OutboundFrame) -> bool;

    /// Idempotent close
    fn close(&mut self);
}

/// WebSocket connector for `{channel_base}/ws/chat/{room}/`
#[derive(Debug, Clone)]
pub struct WsConnector {
    config: Config,
}

impl WsConnector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&self, room: &RoomId) -> Result<WsTransport, SyncError> {
        let url = self.config.channel_url(room);
        tracing::info!("[CHANNEL] Connecting to {}", url);

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| SyncError::channel(room.as_str(), e))?;
        for (name, value) in self.config.auth_headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SyncError::channel(room.as_str(), e))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|e| SyncError::channel(room.as_str(), format!("invalid {} header: {}", name, e)))?;
            request.headers_mut().insert(name, value);
        }

        let limit = self.config.request_timeout();
        let handshake = timeout(limit, connect_async(request))
            .await
            .map_err(|_| SyncError::channel(room.as_str(), format!("handshake timed out after {:?}", limit)))?;

        match handshake {
            Ok((stream, _response)) => Ok(WsTransport {
                room: room.clone(),
                stream,
            }),
            Err(tungstenite::Error::Http(response))
                if response.status() == StatusCode::UNAUTHORIZED
                    || response.status() == StatusCode::FORBIDDEN =>
            {
                Err(SyncError::channel(
                    room.as_str(),
                    format!("handshake rejected ({}); check credentials", response.status()),
                ))
            }
            Err(e) => Err(SyncError::channel(room.as_str(), e)),
        }
    }
}

/// A connected room WebSocket
pub struct WsTransport {
    room: RoomId,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<(), SyncError> {
        self.stream
            .send(WsMessage::Text(text))
            .await
            .map_err(|e| SyncError::channel(self.room.as_str(), e))
    }

    async fn recv_text(&mut self) -> Option<Result<String, SyncError>> {
        loop {
            match self.stream.next().await? {
                Ok(WsMessage::Text(text)) => return Some(Ok(text)),
                Ok(WsMessage::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => tracing::warn!("[CHANNEL] Ignoring non-UTF-8 binary frame"),
                },
                Ok(WsMessage::Close(frame)) => {
                    tracing::debug!("[CHANNEL] Server closed room {}: {:?}", self.room, frame);
                    return None;
                }
                // ping/pong are answered by tungstenite
                Ok(_) => continue,
                Err(e) => return Some(Err(SyncError::channel(self.room.as_str(), e))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!("[CHANNEL] Close handshake for room {} failed: {}", self.room, e);
        }
    }
}

/// Handle to one live connection
#[derive(Debug)]
pub struct ChannelSession {
    room: RoomId,
    cmd_tx: mpsc::UnboundedSender<OutboundFrame>,
    open: Arc<AtomicBool>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ChannelSession {
    /// Start connecting to `room`
    ///
    /// Must be called inside a tokio runtime. The returned receiver yields
    /// `Opened` or `Closed` first, then inbound messages, then a final
    /// `Closed` when the connection drops.
    pub fn open<C: Connector>(
        connector: Arc<C>,
        room: RoomId,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let open = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(run_session(
            connector,
            room.clone(),
            cmd_rx,
            event_tx,
            Arc::clone(&open),
            shutdown_rx,
        ));

        let session = Self {
            room,
            cmd_tx,
            open,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        };
        (session, event_rx)
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Queue a frame for delivery; a no-op returning `false` if not open
    pub fn send(&self, frame: OutboundFrame) -> bool {
        if !self.is_open() {
            tracing::debug!("[CHANNEL] Dropping send to room {}; channel not open", self.room);
            return false;
        }
        self.cmd_tx.send(frame).is_ok()
    }

    /// Close the connection; safe to call repeatedly or before it opened
    pub fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            tracing::debug!("[CHANNEL] Closing channel for room {}", self.room);
            let _ = shutdown_tx.send(());
        }
    }

    /// Wait for the session task to finish
    pub async fn closed(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl ChannelSink for ChannelSession {
    fn send(&self, frame: OutboundFrame) -> bool {
        ChannelSession::send(self, frame)
    }

    fn close(&mut self) {
        ChannelSession::close(self)
    }
}

impl Drop for ChannelSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Parse and normalize one inbound text frame
pub fn decode_frame(text: &str) -> Result<Message, SyncError> {
    RawInboundMessage::from_json(text)?.normalize(MessageOrigin::Live, Utc::now())
}

async fn run_session<C: Connector>(
    connector: Arc<C>,
    room: RoomId,
    mut cmd_rx: mpsc::UnboundedReceiver<OutboundFrame>,
    event_tx: mpsc::UnboundedSender<ChannelEvent>,
    open: Arc<AtomicBool>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut transport = tokio::select! {
        _ = &mut shutdown_rx => {
            tracing::debug!("[CHANNEL] Room {} closed before connecting", room);
            return;
        }
        result = connector.connect(&room) => match result {
            Ok(transport) => transport,
            Err(e) => {
                tracing::warn!("[CHANNEL] {}", e);
                let _ = event_tx.send(ChannelEvent::closed(e.to_string()));
                return;
            }
        }
    };

    open.store(true, Ordering::SeqCst);
    tracing::info!("[CHANNEL] Connected to room {}", room);
    let _ = event_tx.send(ChannelEvent::Opened);

    let reason = loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                open.store(false, Ordering::SeqCst);
                transport.close().await;
                tracing::debug!("[CHANNEL] Room {} closed by owner", room);
                return;
            }
            Some(frame) = cmd_rx.recv() => {
                let text = match frame.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("[CHANNEL] Could not encode outbound frame: {}", e);
                        continue;
                    }
                };
                if let Err(e) = transport.send_text(text).await {
                    break Some(e.to_string());
                }
            }
            inbound = transport.recv_text() => match inbound {
                Some(Ok(text)) => match decode_frame(&text) {
                    Ok(message) => {
                        tracing::debug!("[CHANNEL] Received message {:?} in room {}", message.id, room);
                        if event_tx.send(ChannelEvent::Message(message)).is_err() {
                            // owner is gone
                            open.store(false, Ordering::SeqCst);
                            transport.close().await;
                            return;
                        }
                    }
                    Err(e) => tracing::warn!("[CHANNEL] Dropping inbound frame: {}", e),
                },
                Some(Err(e)) => break Some(e.to_string()),
                None => break None,
            }
        }
    };

    open.store(false, Ordering::SeqCst);
    match &reason {
        Some(reason) => tracing::warn!("[CHANNEL] Room {} dropped: {}", room, reason),
        None => tracing::info!("[CHANNEL] Room {} closed by server", room),
    }
    let _ = event_tx.send(ChannelEvent::Closed { reason });
}
