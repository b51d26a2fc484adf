//! Main todo server.

use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{HandlerContext, RequestHandler};
use crate::snapshot::Snapshot;
use crate::store::ListStore;
use crate::users::UserRegistry;
use std::sync::Arc;
use todosync_protocol::{ApiRequest, ApiResponse, ApiService};

/// The todo server.
///
/// Owns the user registry, the list store and the auth gate, and answers
/// [`ApiRequest`]s. The HTTP listener in [`crate::http`] and in-process
/// loopback clients both go through [`TodoServer::handle`].
///
/// # Example
///
/// ```
/// use todosync_protocol::{ApiRequest, Route};
/// use todosync_server::{ServerConfig, TodoServer};
///
/// let server = TodoServer::new(ServerConfig::default()).unwrap();
/// let response = server.handle(&ApiRequest::to(Route::Liveness));
/// assert_eq!(response.status, 200);
/// ```
pub struct TodoServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl TodoServer {
    /// Creates a server on the system clock, restoring the snapshot file if
    /// one is configured and present.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a server on the given clock.
    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> ServerResult<Self> {
        let snapshot = match &config.data_file {
            Some(path) => Snapshot::load(path)?,
            None => None,
        };

        let context = Arc::new(HandlerContext::new(config, clock));
        if let Some(snapshot) = snapshot {
            snapshot.restore(&context.users, &context.store);
        }
        let handler = RequestHandler::new(Arc::clone(&context));

        Ok(Self { handler, context })
    }

    /// Handles a request.
    pub fn handle(&self, request: &ApiRequest) -> ApiResponse {
        self.handler.handle(request)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Returns the list store.
    pub fn store(&self) -> &ListStore {
        &self.context.store
    }

    /// Returns the user registry.
    pub fn users(&self) -> &UserRegistry {
        &self.context.users
    }
}

impl ApiService for TodoServer {
    fn call(&self, request: &ApiRequest) -> ApiResponse {
        self.handle(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use todosync_protocol::{
        AddItemRequest, AuthResponse, CreateListRequest, RegisterRequest, Route, TodoList,
    };

    fn register(server: &TodoServer) -> AuthResponse {
        let request = ApiRequest::to(Route::Register)
            .with_json(&RegisterRequest::new("Ada", "ada@example.com", "pw"))
            .unwrap();
        server.handle(&request).decode().unwrap()
    }

    #[test]
    fn server_lifecycle() {
        let server = TodoServer::new(ServerConfig::default()).unwrap();
        assert!(server.users().is_empty());
        let auth = register(&server);
        assert_eq!(server.users().len(), 1);
        assert!(server.store().list_all(auth.id).is_empty());
    }

    #[test]
    fn state_survives_restart_with_data_file() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::default().with_data_file(dir.path().join("todos.json"));

        let server = TodoServer::new(config.clone()).unwrap();
        let auth = register(&server);
        let list: TodoList = server
            .call(
                &ApiRequest::to(Route::CreateList)
                    .with_bearer(auth.token.clone())
                    .with_json(&CreateListRequest { name: "Main".into() })
                    .unwrap(),
            )
            .decode()
            .unwrap();
        server.call(
            &ApiRequest::to(Route::AddItem(list.id))
                .with_bearer(auth.token.clone())
                .with_json(&AddItemRequest { text: "milk".into() })
                .unwrap(),
        );
        drop(server);

        let restarted = TodoServer::new(config).unwrap();
        let lists = restarted.store().list_all(auth.id);
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].items[0].text, "milk");

        // Tokens stay valid because the secret is unchanged.
        let response = restarted.handle(&ApiRequest::to(Route::ListAll).with_bearer(auth.token));
        assert_eq!(response.status, 200);
    }

    #[test]
    fn concurrent_writes_all_succeed_and_reach_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        let server = TodoServer::new(ServerConfig::default().with_data_file(&path)).unwrap();
        let auth = register(&server);
        let list: TodoList = server
            .handle(
                &ApiRequest::to(Route::CreateList)
                    .with_bearer(auth.token.clone())
                    .with_json(&CreateListRequest { name: "Main".into() })
                    .unwrap(),
            )
            .decode()
            .unwrap();

        let list_id = list.id;
        let statuses: Vec<u16> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..16)
                .map(|worker| {
                    let (server, token) = (&server, &auth.token);
                    scope.spawn(move || {
                        (0..20)
                            .map(|n| {
                                let body = AddItemRequest {
                                    text: format!("item {worker}-{n}"),
                                };
                                let request = ApiRequest::to(Route::AddItem(list_id))
                                    .with_bearer(token.clone())
                                    .with_json(&body)
                                    .unwrap();
                                server.handle(&request).status
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| worker.join().unwrap())
                .collect()
        });

        assert_eq!(statuses.len(), 320);
        assert!(statuses.iter().all(|status| *status == 201));
        assert_eq!(server.store().list_all(auth.id)[0].items.len(), 320);

        let on_disk = Snapshot::load(&path).unwrap().unwrap();
        assert_eq!(on_disk.lists[0].items.len(), 320);
    }
}
