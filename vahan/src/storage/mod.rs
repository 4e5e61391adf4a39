//! Durable client-side key/value storage.
//!
//! Values are strings, keys are restricted to `[A-Za-z0-9_-]`. Well-known keys:
//! - `token`: the bearer token
//! - `state`: serialized auth snapshot
//! - `messages_{session_id}`: serialized message history per session

mod file;
mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;
use crate::models::SessionId;

pub use file::FileStorage;
pub use memory::MemoryStorage;

pub const TOKEN_KEY: &str = "token";
pub const STATE_KEY: &str = "state";

/// Key holding the message history of a session.
pub fn messages_key(session_id: &SessionId) -> String {
    format!("messages_{session_id}")
}

/// Local key/value store shared by the auth layer and the chat lifecycle.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Read and decode a JSON value. A corrupt value is an error, not `None`.
pub fn load_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    storage
        .get(key)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(StorageError::from)
}

pub fn save_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}
