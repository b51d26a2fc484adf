//! HTTP client abstraction.
//!
//! The resolver and the API layer talk to an [`HttpClient`], so tests can
//! swap the network for an in-process [`LoopbackClient`].

use async_trait::async_trait;
use todosync_protocol::{ApiRequest, ApiResponse, ApiService, Method};

use crate::error::{ClientError, ClientResult};

/// HTTP client abstraction.
///
/// `Err` means the request never got an answer (refused, reset, DNS).
/// Any HTTP status, including failures, is an `Ok` response.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends `request` to the service at `base_url`.
    async fn send(&self, base_url: &str, request: &ApiRequest) -> Result<ApiResponse, String>;
}

/// [`HttpClient`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with reqwest defaults.
    pub fn new() -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Connectivity(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, base_url: &str, request: &ApiRequest) -> Result<ApiResponse, String> {
        let url = format!("{base_url}{}", request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if !request.body.is_empty() {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(ApiResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// A loopback HTTP client that routes requests directly to a service.
///
/// The base URL is ignored. Useful for testing without a socket.
pub struct LoopbackClient<S: ApiService> {
    service: S,
}

impl<S: ApiService> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given service.
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: ApiService> HttpClient for LoopbackClient<S> {
    async fn send(&self, _base_url: &str, request: &ApiRequest) -> Result<ApiResponse, String> {
        Ok(self.service.call(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todosync_protocol::Route;

    struct Echo;

    impl ApiService for Echo {
        fn call(&self, request: &ApiRequest) -> ApiResponse {
            ApiResponse {
                status: 200,
                body: request.path.clone().into_bytes(),
            }
        }
    }

    #[tokio::test]
    async fn loopback_ignores_base_url() {
        let client = LoopbackClient::new(Echo);
        let response = client
            .send("http://nowhere:1", &ApiRequest::to(Route::ListAll))
            .await
            .unwrap();
        assert_eq!(response.body, b"/todos");
    }

    #[tokio::test]
    async fn reqwest_reports_refused_connections() {
        // Bind then drop to get a port nobody listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client =
            ReqwestClient::with_client(reqwest::Client::builder().no_proxy().build().unwrap());
        let result = client
            .send(&format!("http://127.0.0.1:{port}"), &ApiRequest::to(Route::Liveness))
            .await;
        assert!(result.is_err());
    }
}
