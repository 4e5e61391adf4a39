//! WebSocket transport built on tokio-tungstenite.
//!
//! Each connection runs in its own task. Outgoing frames travel through an
//! unbounded queue that is only drained after the handshake completes, so
//! frames sent while connecting are delivered in order once the socket opens.
//! Every task ends by emitting `Closed`, whatever the reason. A rejected token
//! (HTTP 401 on the handshake, or close code 1008) is reported as
//! `Unauthorized` just before that.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, error, info, warn};

use super::machine::{ConnectionId, SocketEvent};
use super::transport::{ConnectRequest, SocketEnvelope, SocketHandle, Transport};
use crate::error::ChatError;

enum Outgoing {
    Text(String),
    Close,
}

/// Opens real sockets. Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct WsTransport {
    events: mpsc::UnboundedSender<SocketEnvelope>,
}

impl WsTransport {
    pub const fn new(events: mpsc::UnboundedSender<SocketEnvelope>) -> Self {
        Self { events }
    }
}

impl Transport for WsTransport {
    fn open(&mut self, request: ConnectRequest) -> Result<Box<dyn SocketHandle>, ChatError> {
        let connection = request.connection;
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(request, outgoing_rx, self.events.clone()));
        Ok(Box::new(WsHandle {
            connection,
            outgoing: outgoing_tx,
        }))
    }
}

struct WsHandle {
    connection: ConnectionId,
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl SocketHandle for WsHandle {
    fn send_text(&mut self, text: String) -> Result<(), ChatError> {
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| ChatError::Transport(format!("{} is closed", self.connection)))
    }

    fn close(&mut self) {
        // The task may already be gone; nothing left to close then.
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

async fn run_socket(
    request: ConnectRequest,
    outgoing: mpsc::UnboundedReceiver<Outgoing>,
    events: mpsc::UnboundedSender<SocketEnvelope>,
) {
    let connection = request.connection;
    let emit = |event: SocketEvent| {
        let _ = events.send(SocketEnvelope { connection, event });
    };

    match drive(&request, outgoing, &emit).await {
        Ok(()) => {}
        Err(DriveError::Unauthorized) => {
            warn!(%connection, "socket rejected the token");
            emit(SocketEvent::Unauthorized);
        }
        Err(DriveError::Failed(reason)) => {
            error!(%connection, %reason, "socket error");
            emit(SocketEvent::Errored(reason));
        }
    }
    info!(%connection, "socket closed");
    emit(SocketEvent::Closed);
}

enum DriveError {
    Unauthorized,
    Failed(String),
}

impl From<String> for DriveError {
    fn from(reason: String) -> Self {
        Self::Failed(reason)
    }
}

async fn drive(
    request: &ConnectRequest,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    emit: &impl Fn(SocketEvent),
) -> Result<(), DriveError> {
    let mut ws_request = request
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| format!("invalid socket address {}: {e}", request.url))?;
    if let Some(token) = &request.token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| format!("invalid token header: {e}"))?;
        ws_request.headers_mut().insert(AUTHORIZATION, value);
    }

    let (stream, _) = match connect_async(ws_request).await {
        Ok(connected) => connected,
        Err(WsError::Http(response)) if response.status() == StatusCode::UNAUTHORIZED => {
            return Err(DriveError::Unauthorized);
        }
        Err(e) => return Err(format!("connect to {} failed: {e}", request.url).into()),
    };
    info!(connection = %request.connection, url = %request.url, "socket open");
    emit(SocketEvent::Opened);

    let (mut write, mut read) = stream.split();
    loop {
        tokio::select! {
            frame = outgoing.recv() => match frame {
                Some(Outgoing::Text(text)) => {
                    write
                        .send(WsMessage::Text(text))
                        .await
                        .map_err(|e| DriveError::Failed(e.to_string()))?;
                }
                // Handle closed or dropped.
                Some(Outgoing::Close) | None => {
                    let _ = write.send(WsMessage::Close(None)).await;
                    return Ok(());
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) => emit(SocketEvent::MessageReceived(text)),
                Some(Ok(WsMessage::Binary(bytes))) => {
                    warn!("binary frame received, decoding as UTF-8");
                    emit(SocketEvent::MessageReceived(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!(?frame, "server closed socket");
                    if frame.is_some_and(|f| f.code == CloseCode::Policy) {
                        return Err(DriveError::Unauthorized);
                    }
                    return Ok(());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(DriveError::Failed(e.to_string())),
                None => return Ok(()),
            },
        }
    }
}
