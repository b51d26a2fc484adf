//! Error types for the todo server.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the todo server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// A required field is missing or empty.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Missing, malformed or expired credential, or bad login.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Authenticated, but not the owner of the resource.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// List, item, user or route does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Every candidate port was taken.
    #[error("no available port after trying {tried} candidates")]
    NoAvailablePort {
        /// Number of candidates tried.
        tried: usize,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// JSON encoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::Validation(_) | ServerError::Conflict(_) => 400,
            ServerError::AuthenticationFailed(_) => 401,
            ServerError::NotAuthorized(_) => 403,
            ServerError::NotFound(_) => 404,
            ServerError::NoAvailablePort { .. }
            | ServerError::Internal(_)
            | ServerError::Json(_)
            | ServerError::Io(_) => 500,
        }
    }

    /// Returns the message sent to the caller.
    ///
    /// Server-side failures are reported generically.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::Validation(msg)
            | ServerError::AuthenticationFailed(msg)
            | ServerError::NotAuthorized(msg)
            | ServerError::NotFound(msg)
            | ServerError::Conflict(msg) => msg.clone(),
            _ => "server error".into(),
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<todosync_protocol::ProtocolError> for ServerError {
    fn from(err: todosync_protocol::ProtocolError) -> Self {
        ServerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::Validation("bad".into()).is_client_error());
        assert!(ServerError::Internal("oops".into()).is_server_error());
        assert!(!ServerError::Validation("bad".into()).is_server_error());
    }

    #[test]
    fn status_codes() {
        assert_eq!(ServerError::Validation("x".into()).status_code(), 400);
        assert_eq!(ServerError::Conflict("x".into()).status_code(), 400);
        assert_eq!(ServerError::AuthenticationFailed("x".into()).status_code(), 401);
        assert_eq!(ServerError::NotAuthorized("x".into()).status_code(), 403);
        assert_eq!(ServerError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ServerError::NoAvailablePort { tried: 3 }.status_code(), 500);
    }

    #[test]
    fn internal_details_stay_private() {
        let err = ServerError::Internal("disk on fire".into());
        assert_eq!(err.public_message(), "server error");
        let err = ServerError::NotFound("todo list not found".into());
        assert_eq!(err.public_message(), "todo list not found");
    }

    #[test]
    fn error_display() {
        let err = ServerError::NoAvailablePort { tried: 6 };
        assert!(err.to_string().contains('6'));
    }
}
