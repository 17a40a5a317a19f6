//! Error types for transport, storage, and API operations.

use std::collections::BTreeMap;

use thiserror::Error;

/// Failures below HTTP: the request never produced a status code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The attempt exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,
    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Any other transport failure (aborted, malformed response, ...).
    #[error("transport failure: {0}")]
    Other(String),
}

/// Failures reading or writing persisted credentials.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backing store could not be read or written.
    #[error("token storage unavailable: {0}")]
    Unavailable(String),
    /// Stored payload could not be decoded.
    #[error("token storage payload is corrupt: {0}")]
    Corrupt(String),
}

/// Errors surfaced to callers of the catalog API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Refresh failed or no refresh token was available; the session is gone.
    #[error("session expired; sign in again")]
    AuthExpired,
    /// The server rejected the request after recovery was already spent,
    /// or rejected a public auth call (bad credentials).
    #[error("request was not authorized")]
    Unauthorized {
        /// Server-provided reason, when present.
        message: Option<String>,
    },
    /// Timeout or connectivity failure; never retried by the pipeline.
    #[error("network error: {0}")]
    Network(#[from] TransportError),
    /// Server rejected the payload (duplicate entry, invalid field, ...).
    #[error("validation failed: {message}")]
    Validation {
        /// HTTP status returned by the server.
        status: u16,
        /// Display message.
        message: String,
        /// Per-field messages.
        fields: BTreeMap<String, Vec<String>>,
    },
    /// Requested item or collection entry does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// Path that was requested.
        path: String,
    },
    /// Any other non-success status, passed through untouched.
    #[error("request failed with status {status}")]
    Status {
        /// HTTP status returned by the server.
        status: u16,
        /// Server-provided reason, when present.
        message: Option<String>,
    },
    /// A success response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
    /// A request body could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(String),
    /// Input rejected locally; nothing was sent.
    #[error("{0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Whether the caller should send the user to the login entry point.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    /// Message suitable for direct display in the UI or CLI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Unauthorized {
                message: Some(message),
            }
            | Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }
}
