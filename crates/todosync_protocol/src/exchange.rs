//! Transport-neutral request and response envelopes.
//!
//! The server's handler consumes an `ApiRequest` and produces an
//! `ApiResponse`; HTTP listeners and in-process loopback clients only
//! translate to and from these.

use crate::error::ProtocolResult;
use crate::messages::ErrorBody;
use crate::routes::{Method, Route};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Request path, without host.
    pub path: String,
    /// Bearer credential, without the `Bearer ` prefix.
    pub bearer: Option<String>,
    /// JSON body (empty when absent).
    pub body: Vec<u8>,
}

impl ApiRequest {
    /// Creates a body-less request for a route.
    pub fn to(route: Route) -> Self {
        Self {
            method: route.method(),
            path: route.path(),
            bearer: None,
            body: Vec::new(),
        }
    }

    /// Attaches a JSON body.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> ProtocolResult<Self> {
        self.body = serde_json::to_vec(body)?;
        Ok(self)
    }

    /// Attaches a bearer credential.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Extracts the credential from an `Authorization` header value.
    pub fn bearer_from_header(value: &str) -> Option<String> {
        let token = value.strip_prefix("Bearer ")?.trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}

/// An API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response with a JSON body.
    pub fn json<T: Serialize>(status: u16, body: &T) -> ProtocolResult<Self> {
        Ok(Self {
            status,
            body: serde_json::to_vec(body)?,
        })
    }

    /// Creates a failure response with an `ErrorBody`.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::to_vec(&ErrorBody::new(message)).unwrap_or_default();
        Self { status, body }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body.
    pub fn decode<T: DeserializeOwned>(&self) -> ProtocolResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns the failure message, if the body is an `ErrorBody`.
    pub fn error_message(&self) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(&self.body)
            .ok()
            .map(|body| body.message)
    }
}

/// Anything that answers API requests in-process.
///
/// The server implements this; loopback clients and tests call it directly.
pub trait ApiService: Send + Sync {
    /// Handles one request.
    fn call(&self, request: &ApiRequest) -> ApiResponse;
}

impl<T: ApiService + ?Sized> ApiService for std::sync::Arc<T> {
    fn call(&self, request: &ApiRequest) -> ApiResponse {
        (**self).call(request)
    }
}
