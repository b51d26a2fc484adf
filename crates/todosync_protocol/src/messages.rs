//! Request and response bodies.

use crate::ids::{ListId, UserId};
use serde::{Deserialize, Serialize};

/// Message returned by the liveness route.
pub const LIVENESS_MESSAGE: &str = "API is running...";

/// Body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login email.
    #[serde(default)]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    /// Creates a registration request.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Body of `POST /users/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    #[serde(default)]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// Creates a login request.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Successful registration or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Normalized email.
    pub email: String,
    /// Bearer credential for subsequent calls.
    pub token: String,
}

/// Body of `GET /users/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Normalized email.
    pub email: String,
}

/// Body of `POST /todos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateListRequest {
    /// List name.
    #[serde(default)]
    pub name: String,
}

/// Body of `POST /todos/:id/items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItemRequest {
    /// Item text.
    #[serde(default)]
    pub text: String,
}

/// Acknowledgement for `DELETE /todos/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteListAck {
    /// Human-readable confirmation.
    pub message: String,
    /// The removed list.
    pub list_id: ListId,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always false.
    pub success: bool,
    /// Failure description.
    pub message: String,
}

impl ErrorBody {
    /// Creates a failure body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Body of the liveness route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liveness {
    /// Fixed status message.
    pub message: String,
}

impl Default for Liveness {
    fn default() -> Self {
        Self {
            message: LIVENESS_MESSAGE.into(),
        }
    }
}
