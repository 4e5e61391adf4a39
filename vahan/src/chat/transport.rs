//! Socket transport abstraction.
//!
//! A `Transport` opens one socket per `ConnectRequest` and reports everything
//! that happens on it as `SocketEnvelope`s on a single channel owned by the
//! caller. The returned `SocketHandle` is the only way to write to or close
//! the socket; dropping it closes the socket too.

use super::machine::{ConnectionId, SocketEvent};
use crate::error::ChatError;

/// A socket event tagged with the connection it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEnvelope {
    pub connection: ConnectionId,
    pub event: SocketEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub connection: ConnectionId,
    /// Full socket address including `?session_id=`.
    pub url: String,
    /// Bearer token sent with the handshake, if logged in.
    pub token: Option<String>,
}

pub trait SocketHandle: Send {
    /// Queue a text frame. Frames queued before the socket opens are sent
    /// once it does.
    fn send_text(&mut self, text: String) -> Result<(), ChatError>;

    fn close(&mut self);
}

pub trait Transport {
    fn open(&mut self, request: ConnectRequest) -> Result<Box<dyn SocketHandle>, ChatError>;
}
