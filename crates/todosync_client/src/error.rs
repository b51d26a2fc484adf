//! Error types for the todo client.

use thiserror::Error;
use todosync_protocol::{ItemId, ListId};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur during client operations.
///
/// A failed call never touches local state.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server rejected the input (400).
    #[error("invalid request: {0}")]
    Validation(String),

    /// Missing, invalid or expired credential, or bad login (401).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The caller does not own the resource (403).
    #[error("not authorized: {0}")]
    Authorization(String),

    /// The resource does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the error body.
        message: String,
    },

    /// No candidate endpoint could be reached.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// A response body could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The call needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,

    /// The call needs an active list.
    #[error("no active list")]
    NoActiveList,

    /// The list is not in local state.
    #[error("unknown list: {0}")]
    UnknownList(ListId),

    /// The item is not in the active list.
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),
}

impl ClientError {
    /// Maps a non-success status and its message to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => ClientError::Validation(message),
            401 => ClientError::Authentication(message),
            403 => ClientError::Authorization(message),
            404 => ClientError::NotFound(message),
            status => ClientError::Server { status, message },
        }
    }

    /// Returns true if the service could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ClientError::Connectivity(_))
    }
}

impl From<todosync_protocol::ProtocolError> for ClientError {
    fn from(err: todosync_protocol::ProtocolError) -> Self {
        ClientError::Protocol(err.to_string())
    }
}
