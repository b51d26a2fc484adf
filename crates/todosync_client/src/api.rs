//! Typed remote calls.
//!
//! Each method makes exactly one API request against the resolved endpoint.
//! A transport failure invalidates the resolver memo and surfaces as
//! [`ClientError::Connectivity`]; the call is not retried.

use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use crate::resolver::EndpointResolver;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use todosync_protocol::{
    AddItemRequest, ApiRequest, AuthResponse, CreateListRequest, DeleteListAck, EndpointConfig,
    ItemId, ItemPatch, ListId, LoginRequest, Profile, RegisterRequest, Route, TodoList,
};
use tracing::{debug, warn};

/// Remote todo API.
pub struct TodoApi<C: HttpClient> {
    client: Arc<C>,
    resolver: EndpointResolver<C>,
}

impl<C: HttpClient> TodoApi<C> {
    /// Creates an API over the given client and candidates.
    pub fn new(endpoint: EndpointConfig, client: C, probe_timeout: Duration) -> Self {
        let client = Arc::new(client);
        let resolver = EndpointResolver::new(endpoint, Arc::clone(&client), probe_timeout);
        Self { client, resolver }
    }

    /// Returns the endpoint resolver.
    pub fn resolver(&self) -> &EndpointResolver<C> {
        &self.resolver
    }

    /// Registers a new user.
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<AuthResponse> {
        self.call(ApiRequest::to(Route::Register).with_json(request)?)
            .await
    }

    /// Logs in.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse> {
        self.call(ApiRequest::to(Route::Login).with_json(request)?)
            .await
    }

    /// Fetches the caller's profile.
    pub async fn profile(&self, token: &str) -> ClientResult<Profile> {
        self.call(ApiRequest::to(Route::Profile).with_bearer(token))
            .await
    }

    /// Fetches every list the caller owns.
    pub async fn list_all(&self, token: &str) -> ClientResult<Vec<TodoList>> {
        self.call(ApiRequest::to(Route::ListAll).with_bearer(token))
            .await
    }

    /// Creates an empty list.
    pub async fn create_list(&self, token: &str, name: &str) -> ClientResult<TodoList> {
        let body = CreateListRequest { name: name.into() };
        self.call(
            ApiRequest::to(Route::CreateList)
                .with_bearer(token)
                .with_json(&body)?,
        )
        .await
    }

    /// Deletes a list.
    pub async fn delete_list(&self, token: &str, list_id: ListId) -> ClientResult<DeleteListAck> {
        self.call(ApiRequest::to(Route::DeleteList(list_id)).with_bearer(token))
            .await
    }

    /// Appends an item and returns the whole list.
    pub async fn add_item(&self, token: &str, list_id: ListId, text: &str) -> ClientResult<TodoList> {
        let body = AddItemRequest { text: text.into() };
        self.call(
            ApiRequest::to(Route::AddItem(list_id))
                .with_bearer(token)
                .with_json(&body)?,
        )
        .await
    }

    /// Applies a patch to an item and returns the whole list.
    pub async fn update_item(
        &self,
        token: &str,
        list_id: ListId,
        item_id: ItemId,
        patch: &ItemPatch,
    ) -> ClientResult<TodoList> {
        self.call(
            ApiRequest::to(Route::UpdateItem(list_id, item_id))
                .with_bearer(token)
                .with_json(patch)?,
        )
        .await
    }

    /// Removes an item and returns the whole list.
    pub async fn delete_item(
        &self,
        token: &str,
        list_id: ListId,
        item_id: ItemId,
    ) -> ClientResult<TodoList> {
        self.call(ApiRequest::to(Route::DeleteItem(list_id, item_id)).with_bearer(token))
            .await
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let base_url = self.resolver.resolve().await;
        debug!("{} {}{}", request.method, base_url, request.path);

        let response = self.client.send(&base_url, &request).await.map_err(|e| {
            warn!("request to {base_url} failed: {e}");
            self.resolver.invalidate_url(&base_url);
            ClientError::Connectivity(e)
        })?;

        if !response.is_success() {
            let message = response
                .error_message()
                .unwrap_or_else(|| format!("request failed with status {}", response.status));
            debug!(status = response.status, "{} {} failed: {message}", request.method, request.path);
            return Err(ClientError::from_status(response.status, message));
        }

        response
            .decode()
            .map_err(|e| ClientError::Protocol(format!("failed to decode response: {e}")))
    }
}
