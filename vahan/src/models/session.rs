//! Chat session model.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

const ID_PREFIX: &str = "session_";
const ID_RANDOM_LEN: usize = 12;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_MAX_LEN: usize = 128;

/// Opaque session identifier.
///
/// Restricted to `[A-Za-z0-9_-]` because it is embedded both in a storage key
/// and in the socket address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh id: `session_` followed by 12 base-36 characters
    /// (about 62 bits of entropy).
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..ID_RANDOM_LEN)
            .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
            .collect();
        Self(format!("{ID_PREFIX}{suffix}"))
    }

    /// Validate an externally supplied id (e.g. from a shared link).
    pub fn parse(raw: &str) -> Result<Self, ChatError> {
        let raw = raw.trim();
        let valid = !raw.is_empty()
            && raw.len() <= ID_MAX_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(ChatError::InvalidSessionId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionId {
    type Error = ChatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// One chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_format() {
        let id = SessionId::generate();
        let suffix = id.as_str().strip_prefix("session_").unwrap();
        assert_eq!(suffix.len(), 12);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_generate_unique() {
        let ids: HashSet<_> = (0..1000).map(|_| SessionId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_parse_accepts_shared_link_ids() {
        assert_eq!(SessionId::parse(" session_abc123 ").unwrap().as_str(), "session_abc123");
        assert!(SessionId::parse("0190f0e2-7b7c-7c3e").is_ok());
    }

    #[test]
    fn test_parse_rejects_unsafe_ids() {
        for bad in ["", "   ", "../etc/passwd", "a b", "x?session_id=y"] {
            assert!(
                matches!(SessionId::parse(bad), Err(ChatError::InvalidSessionId(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(SessionId::parse(&"a".repeat(129)).is_err());
    }
}
