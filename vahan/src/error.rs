//! Error types for the client library.
//!
//! Each concern gets its own enum. The binary wraps them in `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reading or writing durable client storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Filesystem failure for a specific key.
    #[error("storage I/O error for key {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored value could not be (de)serialized.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure talking to the HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer token is stored; the request was not sent.
    #[error("No authentication token found")]
    MissingToken,

    /// Server answered 401 to an authenticated request. The stored token has
    /// already been cleared when this is returned.
    #[error("Unauthorized: please log in again")]
    Unauthorized,

    /// Non-success status with the best message we could extract.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    /// Server answered 200 but reported an error in the body.
    #[error("Server error: {0}")]
    Remote(String),

    /// Input rejected locally before any request.
    #[error("{0}")]
    Validation(String),

    /// Transport-level failure (connect, timeout, decode).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Local file could not be read for upload.
    #[error("Failed to read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Whether the caller should send the user back to login.
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::MissingToken)
    }
}

/// Failure in the chat session lifecycle.
#[derive(Debug, Error)]
pub enum ChatError {
    /// A session cannot be created without a stored token.
    #[error("Authentication required: please log in to start a conversation")]
    AuthenticationRequired,

    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("socket transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure loading client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid URL {value:?}: {reason}")]
    InvalidUrl { value: String, reason: String },
}
