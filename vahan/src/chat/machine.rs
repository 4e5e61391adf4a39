//! Chat session state machine.
//!
//! `transition` is the only place chat state changes. It performs no I/O;
//! instead it returns the effects (connect, transmit, persist, disconnect) the
//! caller must carry out, in order.
//!
//! ```text
//! Idle --start--> Connecting --Opened--> Active
//!  ^                  |                    |
//!  +------close-------+-------close--------+
//! any --start--> Connecting (previous connection discarded)
//! ```

use chrono::{DateTime, Utc};

use crate::models::{Message, Session, SessionId};

/// Identifies one socket connection. Events from any connection other than the
/// current one are stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// No socket. Either no session is loaded or its socket has closed.
    #[default]
    Idle,
    /// Socket requested, not yet open.
    Connecting,
    /// Socket open.
    Active,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Active => "active",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Something the socket reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    MessageReceived(String),
    Closed,
    Errored(String),
    /// The server refused the bearer token (HTTP 401 on the handshake, or
    /// close code 1008 after it).
    Unauthorized,
}

#[derive(Debug, Clone)]
pub enum Input {
    /// Make `session` the active session with the given history.
    Start {
        session: Session,
        history: Vec<Message>,
    },
    /// User submitted a message.
    Send(Message),
    Socket {
        connection: ConnectionId,
        event: SocketEvent,
    },
    /// Unload the session and drop its socket.
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Close and drop the socket for this connection.
    Disconnect(ConnectionId),
    /// Open a socket for the session under this connection id.
    Connect {
        connection: ConnectionId,
        session_id: SessionId,
    },
    /// Send a message over the socket.
    Transmit {
        connection: ConnectionId,
        message: Message,
    },
    /// Write the active session's history to storage.
    PersistHistory,
    /// A payload was not a message frame and was kept as raw text.
    RawPayload(ConnectionId),
    /// Forget the stored bearer token.
    ClearToken,
}

#[derive(Debug, Default)]
pub struct ChatState {
    session: Option<Session>,
    messages: Vec<Message>,
    phase: Phase,
    connection: Option<ConnectionId>,
    next_connection: u64,
    awaiting_reply: bool,
    last_error: Option<String>,
}

impl ChatState {
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|s| &s.id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// The "Thinking..." indicator.
    pub const fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn allocate_connection(&mut self) -> ConnectionId {
        self.next_connection += 1;
        ConnectionId(self.next_connection)
    }
}

/// Apply one input. `now` stamps messages synthesized from raw socket text.
pub fn transition(state: &mut ChatState, input: Input, now: DateTime<Utc>) -> Vec<Effect> {
    match input {
        Input::Start { session, history } => {
            let mut effects = Vec::new();
            if let Some(old) = state.connection.take() {
                effects.push(Effect::Disconnect(old));
            }
            let connection = state.allocate_connection();
            let session_id = session.id.clone();

            state.session = Some(session);
            state.messages = history;
            state.phase = Phase::Connecting;
            state.connection = Some(connection);
            state.awaiting_reply = false;
            state.last_error = None;

            effects.push(Effect::PersistHistory);
            effects.push(Effect::Connect {
                connection,
                session_id,
            });
            effects
        }

        Input::Send(message) => {
            if state.session.is_none() || message.content.trim().is_empty() {
                return Vec::new();
            }
            state.messages.push(message.clone());
            let mut effects = vec![Effect::PersistHistory];
            if let Some(connection) = state.connection {
                state.awaiting_reply = true;
                effects.push(Effect::Transmit {
                    connection,
                    message,
                });
            }
            effects
        }

        Input::Socket { connection, event } => {
            if state.connection != Some(connection) {
                return Vec::new();
            }
            match event {
                SocketEvent::Opened => {
                    if state.phase == Phase::Connecting {
                        state.phase = Phase::Active;
                    }
                    Vec::new()
                }
                SocketEvent::MessageReceived(payload) => {
                    let (message, structured) = Message::from_socket_payload(&payload, now);
                    state.messages.push(message);
                    state.awaiting_reply = false;
                    if structured {
                        vec![Effect::PersistHistory]
                    } else {
                        vec![Effect::RawPayload(connection), Effect::PersistHistory]
                    }
                }
                SocketEvent::Closed => {
                    state.connection = None;
                    state.phase = Phase::Idle;
                    state.awaiting_reply = false;
                    vec![Effect::Disconnect(connection)]
                }
                SocketEvent::Errored(reason) => {
                    state.last_error = Some(reason);
                    Vec::new()
                }
                SocketEvent::Unauthorized => {
                    state.connection = None;
                    state.session = None;
                    state.messages.clear();
                    state.phase = Phase::Idle;
                    state.awaiting_reply = false;
                    state.last_error = Some("authorization rejected".to_string());
                    vec![Effect::Disconnect(connection), Effect::ClearToken]
                }
            }
        }

        Input::Close => {
            let mut effects = Vec::new();
            if let Some(connection) = state.connection.take() {
                effects.push(Effect::Disconnect(connection));
            }
            state.session = None;
            state.messages.clear();
            state.phase = Phase::Idle;
            state.awaiting_reply = false;
            effects
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sender;

    fn start(state: &mut ChatState, id: &str, history: Vec<Message>) -> ConnectionId {
        let session = Session::new(SessionId::parse(id).unwrap());
        transition(state, Input::Start { session, history }, Utc::now());
        state.connection().unwrap()
    }

    fn socket(state: &mut ChatState, connection: ConnectionId, event: SocketEvent) -> Vec<Effect> {
        transition(state, Input::Socket { connection, event }, Utc::now())
    }

    #[test]
    fn test_start_connects_and_persists() {
        let mut state = ChatState::default();
        let session = Session::new(SessionId::parse("session_a").unwrap());
        let effects = transition(
            &mut state,
            Input::Start {
                session,
                history: Vec::new(),
            },
            Utc::now(),
        );

        let connection = state.connection().unwrap();
        assert_eq!(
            effects,
            vec![
                Effect::PersistHistory,
                Effect::Connect {
                    connection,
                    session_id: SessionId::parse("session_a").unwrap()
                }
            ]
        );
        assert_eq!(state.phase(), Phase::Connecting);

        socket(&mut state, connection, SocketEvent::Opened);
        assert_eq!(state.phase(), Phase::Active);
    }

    #[test]
    fn test_restart_discards_previous_connection() {
        let mut state = ChatState::default();
        let first = start(&mut state, "session_a", Vec::new());
        socket(&mut state, first, SocketEvent::Opened);

        let session = Session::new(SessionId::parse("session_b").unwrap());
        let history = vec![Message::user("earlier")];
        let effects = transition(
            &mut state,
            Input::Start {
                session,
                history: history.clone(),
            },
            Utc::now(),
        );
        assert_eq!(effects[0], Effect::Disconnect(first));
        assert_eq!(state.phase(), Phase::Connecting);
        assert_eq!(state.messages(), history.as_slice());

        let second = state.connection().unwrap();
        assert_ne!(first, second);

        // Late traffic from the old socket must not leak into the new session.
        assert!(socket(&mut state, first, SocketEvent::MessageReceived("stale".into())).is_empty());
        assert!(socket(&mut state, first, SocketEvent::Closed).is_empty());
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.phase(), Phase::Connecting);
    }

    #[test]
    fn test_send_appends_and_transmits() {
        let mut state = ChatState::default();
        let connection = start(&mut state, "session_a", Vec::new());

        let message = Message::user("Hello");
        let effects = transition(&mut state, Input::Send(message.clone()), Utc::now());
        assert_eq!(
            effects,
            vec![
                Effect::PersistHistory,
                Effect::Transmit {
                    connection,
                    message
                }
            ]
        );
        assert!(state.is_awaiting_reply());

        socket(
            &mut state,
            connection,
            SocketEvent::MessageReceived(r#"{"content":"Hi there","sender":"agent"}"#.into()),
        );
        assert!(!state.is_awaiting_reply());
        let senders: Vec<_> = state.messages().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::User, Sender::Agent]);
    }

    #[test]
    fn test_send_ignored_without_session_or_text() {
        let mut state = ChatState::default();
        assert!(transition(&mut state, Input::Send(Message::user("hi")), Utc::now()).is_empty());
        assert!(state.messages().is_empty());

        start(&mut state, "session_a", Vec::new());
        for blank in ["", "   ", "\n\t"] {
            assert!(transition(&mut state, Input::Send(Message::user(blank)), Utc::now()).is_empty());
        }
        assert!(state.messages().is_empty());
        assert!(!state.is_awaiting_reply());
    }

    #[test]
    fn test_closed_socket_keeps_history_local() {
        let mut state = ChatState::default();
        let connection = start(&mut state, "session_a", Vec::new());
        socket(&mut state, connection, SocketEvent::Opened);
        transition(&mut state, Input::Send(Message::user("one")), Utc::now());

        let effects = socket(&mut state, connection, SocketEvent::Closed);
        assert_eq!(effects, vec![Effect::Disconnect(connection)]);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.is_awaiting_reply());
        assert!(state.session().is_some());

        let effects = transition(&mut state, Input::Send(Message::user("two")), Utc::now());
        assert_eq!(effects, vec![Effect::PersistHistory]);
        assert_eq!(state.messages().len(), 2);
        assert!(!state.is_awaiting_reply());
    }

    #[test]
    fn test_error_is_recorded_without_state_change() {
        let mut state = ChatState::default();
        let connection = start(&mut state, "session_a", Vec::new());
        socket(&mut state, connection, SocketEvent::Opened);
        assert!(socket(&mut state, connection, SocketEvent::Errored("reset".into())).is_empty());
        assert_eq!(state.last_error(), Some("reset"));
        assert_eq!(state.phase(), Phase::Active);
    }

    #[test]
    fn test_non_message_payload_is_flagged_raw() {
        let mut state = ChatState::default();
        let connection = start(&mut state, "session_a", Vec::new());

        for payload in [r#"{"text":"x"}"#, "42", "plain words"] {
            let effects = socket(&mut state, connection, SocketEvent::MessageReceived(payload.into()));
            assert_eq!(effects, vec![Effect::RawPayload(connection), Effect::PersistHistory]);
            let last = state.messages().last().unwrap();
            assert_eq!(last.sender, Sender::Agent);
            assert_eq!(last.content, payload);
        }

        let effects = socket(
            &mut state,
            connection,
            SocketEvent::MessageReceived(r#"{"content":"ok"}"#.into()),
        );
        assert_eq!(effects, vec![Effect::PersistHistory]);
    }

    #[test]
    fn test_unauthorized_unloads_and_clears_token() {
        let mut state = ChatState::default();
        let connection = start(&mut state, "session_a", vec![Message::user("kept on disk")]);
        socket(&mut state, connection, SocketEvent::Opened);
        transition(&mut state, Input::Send(Message::user("hello")), Utc::now());

        let effects = socket(&mut state, connection, SocketEvent::Unauthorized);
        assert_eq!(effects, vec![Effect::Disconnect(connection), Effect::ClearToken]);
        assert!(state.session().is_none());
        assert!(state.messages().is_empty());
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.is_awaiting_reply());
        assert!(state.last_error().is_some());

        // The trailing close from the same socket is stale now.
        assert!(socket(&mut state, connection, SocketEvent::Closed).is_empty());
    }

    #[test]
    fn test_close_unloads_session() {
        let mut state = ChatState::default();
        let connection = start(&mut state, "session_a", vec![Message::user("kept on disk")]);
        let effects = transition(&mut state, Input::Close, Utc::now());
        assert_eq!(effects, vec![Effect::Disconnect(connection)]);
        assert!(state.session().is_none());
        assert!(state.messages().is_empty());
        assert_eq!(state.phase(), Phase::Idle);

        assert!(transition(&mut state, Input::Close, Utc::now()).is_empty());
    }
}
