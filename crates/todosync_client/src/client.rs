//! Client-side list state.
//!
//! [`TodoClient`] keeps a local copy of the signed-in user's lists and the
//! active list selection. Every item intent makes exactly one remote call
//! and, on success, replaces the local list with the one the server
//! returned. Local state is never edited optimistically and is left as is
//! when a call fails.

use crate::api::TodoApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use crate::resolver::EndpointResolver;
use chrono::{NaiveDate, NaiveTime};
use parking_lot::RwLock;
use todosync_protocol::{
    AuthResponse, ItemId, ItemPatch, ListId, LoginRequest, Profile, RegisterRequest, TodoItem,
    TodoList,
};
use tracing::{debug, info};

/// Counters for remote calls made through a [`TodoClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientStats {
    /// Calls that returned a success response.
    pub calls_succeeded: u64,
    /// Calls that failed for any reason.
    pub calls_failed: u64,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct LocalState {
    session: Option<AuthResponse>,
    lists: Vec<TodoList>,
    active: Option<ListId>,
}

impl LocalState {
    fn replace_list(&mut self, list: TodoList) {
        match self.lists.iter_mut().find(|l| l.id == list.id) {
            Some(slot) => *slot = list,
            None => self.lists.push(list),
        }
    }

    fn active_list(&self) -> Option<&TodoList> {
        let id = self.active?;
        self.lists.iter().find(|l| l.id == id)
    }
}

/// The todo client.
pub struct TodoClient<C: HttpClient> {
    config: ClientConfig,
    api: TodoApi<C>,
    state: RwLock<LocalState>,
    stats: RwLock<ClientStats>,
}

impl<C: HttpClient> TodoClient<C> {
    /// Creates a signed-out client.
    pub fn new(config: ClientConfig, client: C) -> Self {
        let api = TodoApi::new(config.endpoint.clone(), client, config.probe_timeout);
        Self {
            config,
            api,
            state: RwLock::new(LocalState::default()),
            stats: RwLock::new(ClientStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the endpoint resolver.
    pub fn resolver(&self) -> &EndpointResolver<C> {
        self.api.resolver()
    }

    /// Returns call statistics.
    pub fn stats(&self) -> ClientStats {
        self.stats.read().clone()
    }

    /// Returns the current session, if signed in.
    pub fn session(&self) -> Option<AuthResponse> {
        self.state.read().session.clone()
    }

    /// Returns true if a user is signed in.
    pub fn is_signed_in(&self) -> bool {
        self.state.read().session.is_some()
    }

    /// Returns a copy of the local lists.
    pub fn lists(&self) -> Vec<TodoList> {
        self.state.read().lists.clone()
    }

    /// Returns the active list id.
    pub fn active_list_id(&self) -> Option<ListId> {
        self.state.read().active
    }

    /// Returns a copy of the active list.
    pub fn active_list(&self) -> Option<TodoList> {
        self.state.read().active_list().cloned()
    }

    /// Registers a new user, signs in and loads their lists.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ClientResult<Profile> {
        let request = RegisterRequest::new(name, email, password);
        let session = self.track(self.api.register(&request).await)?;
        self.start_session(session).await
    }

    /// Logs in and loads the user's lists.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Profile> {
        let request = LoginRequest::new(email, password);
        let session = self.track(self.api.login(&request).await)?;
        self.start_session(session).await
    }

    /// Adopts a previously issued session without contacting the server.
    pub fn resume(&self, session: AuthResponse) {
        let mut state = self.state.write();
        *state = LocalState {
            session: Some(session),
            ..LocalState::default()
        };
    }

    /// Drops the session and all local lists.
    pub fn sign_out(&self) {
        *self.state.write() = LocalState::default();
        info!("signed out");
    }

    /// Fetches the caller's profile.
    pub async fn profile(&self) -> ClientResult<Profile> {
        let token = self.token()?;
        self.track(self.api.profile(&token).await)
    }

    /// Fetches every list. When the user has none, creates the default
    /// list first.
    pub async fn load(&self) -> ClientResult<()> {
        let token = self.token()?;
        let mut lists = self.track(self.api.list_all(&token).await)?;
        if lists.is_empty() {
            let name = self.config.default_list_name.as_str();
            debug!("no lists yet, creating {name:?}");
            lists.push(self.track(self.api.create_list(&token, name).await)?);
        }

        let mut state = self.state.write();
        let keep_active = state
            .active
            .filter(|id| lists.iter().any(|l| l.id == *id));
        state.active = keep_active.or_else(|| lists.first().map(|l| l.id));
        state.lists = lists;
        Ok(())
    }

    /// Creates a list and makes it active.
    pub async fn create_list(&self, name: &str) -> ClientResult<ListId> {
        let token = self.token()?;
        let list = self.track(self.api.create_list(&token, name).await)?;
        let id = list.id;

        let mut state = self.state.write();
        state.replace_list(list);
        state.active = Some(id);
        Ok(id)
    }

    /// Makes a local list active.
    pub fn select_list(&self, list_id: ListId) -> ClientResult<()> {
        let mut state = self.state.write();
        if !state.lists.iter().any(|l| l.id == list_id) {
            return Err(ClientError::UnknownList(list_id));
        }
        state.active = Some(list_id);
        Ok(())
    }

    /// Deletes a list. If it was active, the first remaining list becomes
    /// active.
    pub async fn delete_list(&self, list_id: ListId) -> ClientResult<()> {
        let token = self.token()?;
        let ack = self.track(self.api.delete_list(&token, list_id).await)?;

        let mut state = self.state.write();
        state.lists.retain(|l| l.id != ack.list_id);
        if state.active == Some(ack.list_id) {
            state.active = state.lists.first().map(|l| l.id);
        }
        Ok(())
    }

    /// Appends an item to the active list.
    pub async fn add_item(&self, text: &str) -> ClientResult<ItemId> {
        let (token, list) = self.active_context()?;
        let before = list.item_ids();
        let list = self.track(self.api.add_item(&token, list.id, text).await)?;
        let added = list
            .items
            .iter()
            .map(|item| item.id)
            .find(|id| !before.contains(id))
            .ok_or_else(|| ClientError::Protocol("added item missing from response".into()))?;
        self.state.write().replace_list(list);
        Ok(added)
    }

    /// Flips the completion flag of an item in the active list.
    pub async fn toggle_complete(&self, item_id: ItemId) -> ClientResult<()> {
        let item = self.active_item(item_id)?;
        self.update_item(item_id, ItemPatch::new().with_completed(!item.completed))
            .await
    }

    /// Replaces the text of an item in the active list.
    pub async fn edit_text(&self, item_id: ItemId, text: &str) -> ClientResult<()> {
        self.update_item(item_id, ItemPatch::new().with_text(text))
            .await
    }

    /// Sets or clears the due date and time of an item in the active list.
    pub async fn edit_schedule(
        &self,
        item_id: ItemId,
        due_date: Option<NaiveDate>,
        due_time: Option<NaiveTime>,
    ) -> ClientResult<()> {
        let patch = ItemPatch::new()
            .with_due_date(due_date)
            .with_due_time(due_time);
        self.update_item(item_id, patch).await
    }

    /// Flips the priority flag of an item in the active list.
    pub async fn toggle_priority(&self, item_id: ItemId) -> ClientResult<()> {
        let item = self.active_item(item_id)?;
        self.update_item(item_id, ItemPatch::new().with_priority(!item.priority))
            .await
    }

    /// Applies an arbitrary patch to an item in the active list.
    pub async fn update_item(&self, item_id: ItemId, patch: ItemPatch) -> ClientResult<()> {
        let (token, list) = self.active_context()?;
        let list = self.track(self.api.update_item(&token, list.id, item_id, &patch).await)?;
        self.state.write().replace_list(list);
        Ok(())
    }

    /// Removes an item from the active list.
    pub async fn delete_item(&self, item_id: ItemId) -> ClientResult<()> {
        let (token, list) = self.active_context()?;
        let list = self.track(self.api.delete_item(&token, list.id, item_id).await)?;
        self.state.write().replace_list(list);
        Ok(())
    }

    async fn start_session(&self, session: AuthResponse) -> ClientResult<Profile> {
        let profile = Profile {
            id: session.id,
            name: session.name.clone(),
            email: session.email.clone(),
        };
        self.resume(session);
        info!(user = %profile.id, "signed in");
        self.load().await?;
        Ok(profile)
    }

    fn token(&self) -> ClientResult<String> {
        self.state
            .read()
            .session
            .as_ref()
            .map(|s| s.token.clone())
            .ok_or(ClientError::NotSignedIn)
    }

    fn active_context(&self) -> ClientResult<(String, TodoList)> {
        let token = self.token()?;
        let list = self.active_list().ok_or(ClientError::NoActiveList)?;
        Ok((token, list))
    }

    fn active_item(&self, item_id: ItemId) -> ClientResult<TodoItem> {
        let list = self.active_list().ok_or(ClientError::NoActiveList)?;
        list.item(&item_id)
            .cloned()
            .ok_or(ClientError::UnknownItem(item_id))
    }

    fn track<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        let mut stats = self.stats.write();
        match &result {
            Ok(_) => stats.calls_succeeded += 1,
            Err(e) => {
                stats.calls_failed += 1;
                stats.last_error = Some(e.to_string());
            }
        }
        result
    }
}
