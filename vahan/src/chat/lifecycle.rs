//! Chat session lifecycle: runs the state machine and carries out its effects
//! against storage and the socket transport.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use super::machine::{transition, ChatState, ConnectionId, Effect, Input, SocketEvent};
use super::transport::{ConnectRequest, SocketEnvelope, SocketHandle, Transport};
use crate::error::ChatError;
use crate::models::{Message, Session, SessionId};
use crate::storage::{load_json, messages_key, save_json, Storage, TOKEN_KEY};

/// Socket address for a session: `<base>/api/chat?session_id=<id>`.
pub fn chat_url(ws_base: &Url, session_id: &SessionId) -> String {
    format!(
        "{}/api/chat?session_id={}",
        ws_base.as_str().trim_end_matches('/'),
        urlencoding::encode(session_id.as_str())
    )
}

/// Read a session's persisted history. Missing or unreadable history is empty.
pub fn read_history(storage: &dyn Storage, session_id: &SessionId) -> Vec<Message> {
    match load_json::<Vec<Message>>(storage, &messages_key(session_id)) {
        Ok(history) => history.unwrap_or_default(),
        Err(e) => {
            warn!(%session_id, error = %e, "discarding unreadable history");
            Vec::new()
        }
    }
}

/// Owns the active session, its history and its socket.
pub struct ChatLifecycle<T: Transport> {
    state: ChatState,
    storage: Arc<dyn Storage>,
    transport: T,
    ws_base: Url,
    socket: Option<(ConnectionId, Box<dyn SocketHandle>)>,
    /// Set when the server rejected the token; reported once by `handle_event`.
    token_rejected: bool,
}

impl<T: Transport> ChatLifecycle<T> {
    pub fn new(storage: Arc<dyn Storage>, transport: T, ws_base: Url) -> Self {
        Self {
            state: ChatState::default(),
            storage,
            transport,
            ws_base,
            socket: None,
            token_rejected: false,
        }
    }

    pub const fn state(&self) -> &ChatState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) const fn transport(&self) -> &T {
        &self.transport
    }

    fn token(&self) -> Result<Option<String>, ChatError> {
        Ok(self.storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// Start a fresh conversation. Requires a stored token; without one,
    /// returns `AuthenticationRequired` and changes nothing.
    pub fn create_session(&mut self) -> Result<SessionId, ChatError> {
        if self.token()?.is_none() {
            warn!("cannot create session without a token");
            return Err(ChatError::AuthenticationRequired);
        }
        let session = Session::new(SessionId::generate());
        let id = session.id.clone();
        info!(session_id = %id, "creating session");
        self.apply(Input::Start {
            session,
            history: Vec::new(),
        })?;
        Ok(id)
    }

    /// Activate an externally supplied session id, restoring its history.
    pub fn load_session(&mut self, raw_id: &str) -> Result<SessionId, ChatError> {
        let id = SessionId::parse(raw_id)?;
        let history = read_history(self.storage.as_ref(), &id);
        info!(session_id = %id, restored = history.len(), "loading session");
        self.apply(Input::Start {
            session: Session::new(id.clone()),
            history,
        })?;
        Ok(id)
    }

    /// Append and transmit a user message. Returns `false` when ignored
    /// (blank text or no session).
    pub fn send_message(&mut self, text: &str) -> Result<bool, ChatError> {
        let before = self.state.messages().len();
        self.apply(Input::Send(Message::user(text)))?;
        let appended = self.state.messages().len() > before;
        if appended && self.state.connection().is_none() {
            warn!("no open socket, message kept locally");
        }
        Ok(appended)
    }

    /// Feed one socket event through the state machine.
    ///
    /// Returns `AuthenticationRequired` when the server rejected the token on
    /// the current socket. The token is removed from storage and the session
    /// is unloaded by then.
    pub fn handle_event(&mut self, envelope: SocketEnvelope) -> Result<(), ChatError> {
        match &envelope.event {
            SocketEvent::Errored(reason) => {
                warn!(connection = %envelope.connection, %reason, "socket error");
            }
            SocketEvent::MessageReceived(payload) => {
                debug!(connection = %envelope.connection, bytes = payload.len(), "socket message");
            }
            SocketEvent::Opened | SocketEvent::Closed | SocketEvent::Unauthorized => {
                debug!(connection = %envelope.connection, event = ?envelope.event, "socket event");
            }
        }
        self.apply(Input::Socket {
            connection: envelope.connection,
            event: envelope.event,
        })?;
        if std::mem::take(&mut self.token_rejected) {
            return Err(ChatError::AuthenticationRequired);
        }
        Ok(())
    }

    /// Drop the socket and unload the session. History stays in storage.
    pub fn close_session(&mut self) -> Result<(), ChatError> {
        if let Some(id) = self.state.session_id() {
            info!(session_id = %id, "closing session");
        }
        self.apply(Input::Close)
    }

    fn apply(&mut self, input: Input) -> Result<(), ChatError> {
        let mut pending = VecDeque::from([input]);
        while let Some(input) = pending.pop_front() {
            for effect in transition(&mut self.state, input, Utc::now()) {
                if let Some(follow_up) = self.run(effect)? {
                    pending.push_back(follow_up);
                }
            }
        }
        Ok(())
    }

    /// Execute one effect. A failure to open a socket is fed back as a
    /// `Closed` event rather than returned.
    fn run(&mut self, effect: Effect) -> Result<Option<Input>, ChatError> {
        match effect {
            Effect::Disconnect(connection) => {
                if let Some((current, mut handle)) = self.socket.take() {
                    if current == connection {
                        handle.close();
                    } else {
                        self.socket = Some((current, handle));
                    }
                }
            }
            Effect::Connect {
                connection,
                session_id,
            } => {
                let request = ConnectRequest {
                    connection,
                    url: chat_url(&self.ws_base, &session_id),
                    token: self.token()?,
                };
                match self.transport.open(request) {
                    Ok(handle) => self.socket = Some((connection, handle)),
                    Err(e) => {
                        warn!(%connection, error = %e, "could not open socket");
                        return Ok(Some(Input::Socket {
                            connection,
                            event: SocketEvent::Closed,
                        }));
                    }
                }
            }
            Effect::Transmit {
                connection,
                message,
            } => match &mut self.socket {
                Some((current, handle)) if *current == connection => {
                    let frame = message.to_frame().map_err(crate::error::StorageError::from)?;
                    if let Err(e) = handle.send_text(frame) {
                        warn!(%connection, error = %e, "message kept locally, send failed");
                    }
                }
                _ => warn!(%connection, "message kept locally, no open socket"),
            },
            Effect::RawPayload(connection) => {
                warn!(%connection, "payload is not a message frame, keeping raw text");
            }
            Effect::ClearToken => {
                warn!("token rejected by chat socket, clearing credentials");
                self.storage.remove(TOKEN_KEY)?;
                self.token_rejected = true;
            }
            Effect::PersistHistory => {
                if let Some(id) = self.state.session_id() {
                    save_json(
                        self.storage.as_ref(),
                        &messages_key(id),
                        self.state.messages(),
                    )?;
                }
            }
        }
        Ok(None)
    }
}

impl<T: Transport> Drop for ChatLifecycle<T> {
    fn drop(&mut self) {
        if let Some((_, mut handle)) = self.socket.take() {
            handle.close();
        }
    }
}
