//! Message model representing one entry in a chat session's history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Typed by the local user.
    User,
    /// Produced by the remote chat responder.
    #[serde(alias = "ai", alias = "assistant", alias = "bot")]
    Agent,
}

impl Sender {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
        }
    }

    /// Parse a sender label, accepting the aliases agents commonly use.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "agent" | "ai" | "assistant" | "bot" => Some(Self::Agent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message in a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Time-ordered unique id (`UUIDv7`).
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

/// Inbound socket frame. Everything but `content` is optional.
#[derive(Debug, Deserialize)]
struct InboundFrame {
    #[serde(default)]
    id: Option<Value>,
    content: String,
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl Message {
    pub fn new(sender: Sender, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: new_message_id(),
            content: content.into(),
            sender,
            timestamp,
        }
    }

    /// Message typed by the user, stamped now.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content, Utc::now())
    }

    /// Turn a socket payload into a message.
    ///
    /// Structured frames `{content, sender?, timestamp?, id?}` are decoded;
    /// anything else becomes an agent message carrying the raw payload, stamped
    /// with `received_at`. Returns whether the payload was structured.
    pub fn from_socket_payload(payload: &str, received_at: DateTime<Utc>) -> (Self, bool) {
        match serde_json::from_str::<InboundFrame>(payload) {
            Ok(frame) => {
                let id = match frame.id {
                    Some(Value::String(s)) if !s.is_empty() => s,
                    Some(Value::Number(n)) => n.to_string(),
                    _ => new_message_id(),
                };
                let sender = frame
                    .sender
                    .as_deref()
                    .and_then(Sender::from_str)
                    .unwrap_or(Sender::Agent);
                let timestamp = frame
                    .timestamp
                    .as_deref()
                    .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                    .map_or(received_at, |t| t.with_timezone(&Utc));
                (
                    Self {
                        id,
                        content: frame.content,
                        sender,
                        timestamp,
                    },
                    true,
                )
            }
            Err(_) => (Self::new(Sender::Agent, payload, received_at), false),
        }
    }

    /// Wire encoding used when transmitting over the socket.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn new_message_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_payload() {
        let now = Utc::now();
        let (msg, structured) = Message::from_socket_payload(
            r#"{"content":"Hi there","sender":"agent","timestamp":"2024-05-01T10:00:00Z","id":17}"#,
            now,
        );
        assert!(structured);
        assert_eq!(msg.content, "Hi there");
        assert_eq!(msg.sender, Sender::Agent);
        assert_eq!(msg.id, "17");
        assert_eq!(msg.timestamp.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_structured_payload_defaults() {
        let now = Utc::now();
        let (msg, structured) = Message::from_socket_payload(r#"{"content":"ok"}"#, now);
        assert!(structured);
        assert_eq!(msg.sender, Sender::Agent);
        assert_eq!(msg.timestamp, now);
        assert!(!msg.id.is_empty());

        let (msg, _) =
            Message::from_socket_payload(r#"{"content":"ok","sender":"ai","timestamp":"soon"}"#, now);
        assert_eq!(msg.sender, Sender::Agent);
        assert_eq!(msg.timestamp, now);
    }

    #[test]
    fn test_raw_payload_becomes_agent_text() {
        let now = Utc::now();
        for raw in ["The Pink T-shirt costs $12.", "42", "{not json", r#"{"text":"no content"}"#] {
            let (msg, structured) = Message::from_socket_payload(raw, now);
            assert!(!structured, "{raw}");
            assert_eq!(msg.content, raw);
            assert_eq!(msg.sender, Sender::Agent);
            assert_eq!(msg.timestamp, now);
        }
    }

    #[test]
    fn test_frame_shape() {
        let msg = Message::user("Hello");
        let value: Value = serde_json::from_str(&msg.to_frame().unwrap()).unwrap();
        assert_eq!(value["content"], "Hello");
        assert_eq!(value["sender"], "user");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(value["id"], msg.id);
    }
}
