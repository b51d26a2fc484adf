//! Request handlers for the todo endpoints.

use crate::auth::TokenValidator;
use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::snapshot::Snapshot;
use crate::store::ListStore;
use crate::users::UserRegistry;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use todosync_protocol::{
    AddItemRequest, ApiRequest, ApiResponse, AuthResponse, CreateListRequest, DeleteListAck,
    ItemPatch, Liveness, LoginRequest, RegisterRequest, Route, UserId,
};
use tracing::{debug, error, warn};

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Credential issuer and verifier.
    pub auth: TokenValidator,
    /// Registered users.
    pub users: UserRegistry,
    /// Lists and items.
    pub store: ListStore,
    /// Held across capture and save so the last snapshot written is the
    /// newest one.
    persist_lock: Mutex<()>,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            auth: TokenValidator::new(config.auth.clone()),
            config,
            users: UserRegistry::new(),
            store: ListStore::with_clock(clock),
            persist_lock: Mutex::new(()),
        }
    }

    /// Writes a snapshot if persistence is configured.
    fn persist(&self) -> ServerResult<()> {
        let Some(path) = &self.config.data_file else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock();
        Snapshot::capture(&self.users, &self.store).save(path)
    }
}

/// Handler for API requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles a request, translating failures into status + `ErrorBody`.
    pub fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let response = self.dispatch(request).unwrap_or_else(|err| {
            if err.is_server_error() {
                error!(method = %request.method, path = %request.path, "request failed: {err}");
            } else {
                debug!(method = %request.method, path = %request.path, "request rejected: {err}");
            }
            ApiResponse::error(err.status_code(), err.public_message())
        });
        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "handled request"
        );
        response
    }

    fn dispatch(&self, request: &ApiRequest) -> ServerResult<ApiResponse> {
        let route = Route::parse(request.method, &request.path)
            .ok_or_else(|| ServerError::NotFound("route not found".into()))?;

        if request.body.len() > self.context.config.max_body_bytes {
            return Err(ServerError::Validation("request body too large".into()));
        }

        if !route.requires_auth() {
            return self.handle_public(route, request);
        }

        // Nothing below runs without a verified caller.
        let uid = self
            .context
            .auth
            .verify_bearer(request.bearer.as_deref())?;
        self.handle_private(route, uid, request)
    }

    fn handle_public(&self, route: Route, request: &ApiRequest) -> ServerResult<ApiResponse> {
        let ctx = &self.context;
        match route {
            Route::Liveness => Ok(ApiResponse::json(200, &Liveness::default())?),
            Route::Register => {
                let body: RegisterRequest = decode_body(request)?;
                let user = ctx.users.register(&body.name, &body.email, &body.password)?;
                ctx.persist()?;
                let token = ctx.auth.issue(user.id)?;
                Ok(ApiResponse::json(201, &auth_response(&user, token))?)
            }
            Route::Login => {
                let body: LoginRequest = decode_body(request)?;
                let user = ctx.users.authenticate(&body.email, &body.password)?;
                let token = ctx.auth.issue(user.id)?;
                Ok(ApiResponse::json(200, &auth_response(&user, token))?)
            }
            other => Err(ServerError::Internal(format!(
                "route {other:?} requires authentication"
            ))),
        }
    }

    fn handle_private(
        &self,
        route: Route,
        uid: UserId,
        request: &ApiRequest,
    ) -> ServerResult<ApiResponse> {
        let ctx = &self.context;
        let response = match route {
            Route::Profile => {
                return Ok(ApiResponse::json(200, &ctx.users.get(uid)?.profile())?);
            }
            Route::ListAll => return Ok(ApiResponse::json(200, &ctx.store.list_all(uid))?),
            Route::CreateList => {
                let body: CreateListRequest = decode_body(request)?;
                ApiResponse::json(201, &ctx.store.create_list(uid, &body.name)?)?
            }
            Route::DeleteList(list_id) => {
                ctx.store.delete_list(uid, list_id)?;
                let ack = DeleteListAck {
                    message: "list removed".into(),
                    list_id,
                };
                ApiResponse::json(200, &ack)?
            }
            Route::AddItem(list_id) => {
                let body: AddItemRequest = decode_body(request)?;
                ApiResponse::json(201, &ctx.store.add_item(uid, list_id, &body.text)?)?
            }
            Route::UpdateItem(list_id, item_id) => {
                let patch: ItemPatch = decode_body(request)?;
                ApiResponse::json(200, &ctx.store.update_item(uid, list_id, item_id, &patch)?)?
            }
            Route::DeleteItem(list_id, item_id) => {
                ApiResponse::json(200, &ctx.store.delete_item(uid, list_id, item_id)?)?
            }
            other => {
                return Err(ServerError::Internal(format!(
                    "route {other:?} does not take a caller"
                )))
            }
        };

        ctx.persist()?;
        Ok(response)
    }
}

fn auth_response(user: &crate::users::User, token: String) -> AuthResponse {
    AuthResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        token,
    }
}

fn decode_body<T: DeserializeOwned>(request: &ApiRequest) -> ServerResult<T> {
    serde_json::from_slice(&request.body).map_err(|e| {
        warn!(path = %request.path, "malformed body: {e}");
        ServerError::Validation("malformed JSON body".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use todosync_protocol::{ItemId, ListId, Method, Profile, TodoList};

    fn create_handler() -> RequestHandler {
        let context = HandlerContext::new(ServerConfig::default(), Arc::new(ManualClock::new(1)));
        RequestHandler::new(Arc::new(context))
    }

    fn register(handler: &RequestHandler, email: &str) -> AuthResponse {
        let request = ApiRequest::to(Route::Register)
            .with_json(&RegisterRequest::new("Ada", email, "pw"))
            .unwrap();
        let response = handler.handle(&request);
        assert_eq!(response.status, 201);
        response.decode().unwrap()
    }

    fn call<T: serde::Serialize>(
        handler: &RequestHandler,
        route: Route,
        token: &str,
        body: Option<&T>,
    ) -> ApiResponse {
        let mut request = ApiRequest::to(route).with_bearer(token);
        if let Some(body) = body {
            request = request.with_json(body).unwrap();
        }
        handler.handle(&request)
    }

    fn create_list(handler: &RequestHandler, token: &str, name: &str) -> TodoList {
        let body = CreateListRequest { name: name.into() };
        let response = call(handler, Route::CreateList, token, Some(&body));
        assert_eq!(response.status, 201);
        response.decode().unwrap()
    }

    #[test]
    fn liveness() {
        let response = create_handler().handle(&ApiRequest::to(Route::Liveness));
        assert_eq!(response.status, 200);
        let body: Liveness = response.decode().unwrap();
        assert_eq!(body, Liveness::default());
    }

    #[test]
    fn unknown_route_is_404() {
        let request = ApiRequest {
            method: Method::Get,
            path: "/nope".into(),
            bearer: None,
            body: vec![],
        };
        let response = create_handler().handle(&request);
        assert_eq!(response.status, 404);
        assert_eq!(response.error_message().as_deref(), Some("route not found"));
    }

    #[test]
    fn register_login_profile() {
        let handler = create_handler();
        let registered = register(&handler, "ada@example.com");

        let login = ApiRequest::to(Route::Login)
            .with_json(&LoginRequest::new("ada@example.com", "pw"))
            .unwrap();
        let response = handler.handle(&login);
        assert_eq!(response.status, 200);
        let logged_in: AuthResponse = response.decode().unwrap();
        assert_eq!(logged_in.id, registered.id);

        let response = call::<()>(&handler, Route::Profile, &logged_in.token, None);
        assert_eq!(response.status, 200);
        let profile: Profile = response.decode().unwrap();
        assert_eq!(profile.email, "ada@example.com");
    }

    #[test]
    fn duplicate_registration_is_400() {
        let handler = create_handler();
        register(&handler, "ada@example.com");
        let request = ApiRequest::to(Route::Register)
            .with_json(&RegisterRequest::new("Ada", "ada@example.com", "pw"))
            .unwrap();
        assert_eq!(handler.handle(&request).status, 400);
    }

    #[test]
    fn bad_login_is_401() {
        let handler = create_handler();
        register(&handler, "ada@example.com");
        let request = ApiRequest::to(Route::Login)
            .with_json(&LoginRequest::new("ada@example.com", "wrong"))
            .unwrap();
        let response = handler.handle(&request);
        assert_eq!(response.status, 401);
        assert_eq!(response.error_message().as_deref(), Some("invalid credentials"));
    }

    #[test]
    fn private_routes_require_a_valid_token() {
        let handler = create_handler();
        let missing = handler.handle(&ApiRequest::to(Route::ListAll));
        assert_eq!(missing.status, 401);

        let forged = call::<()>(&handler, Route::ListAll, "forged", None);
        assert_eq!(forged.status, 401);

        let body: todosync_protocol::ErrorBody = forged.decode().unwrap();
        assert!(!body.success);
    }

    #[test]
    fn list_lifecycle() {
        let handler = create_handler();
        let auth = register(&handler, "ada@example.com");

        let list = create_list(&handler, &auth.token, "Main");
        assert_eq!(list.name, "Main");

        let body = AddItemRequest { text: "milk".into() };
        let response = call(&handler, Route::AddItem(list.id), &auth.token, Some(&body));
        assert_eq!(response.status, 201);
        let list: TodoList = response.decode().unwrap();
        let item = list.items[0].id;

        let patch = ItemPatch::new().with_priority(true);
        let response = call(
            &handler,
            Route::UpdateItem(list.id, item),
            &auth.token,
            Some(&patch),
        );
        assert_eq!(response.status, 200);
        let list: TodoList = response.decode().unwrap();
        assert!(list.items[0].priority);
        assert!(list.items[0].priority_timestamp.is_some());

        let response = call::<()>(&handler, Route::DeleteItem(list.id, item), &auth.token, None);
        assert_eq!(response.status, 200);
        let list: TodoList = response.decode().unwrap();
        assert!(list.items.is_empty());

        let response = call::<()>(&handler, Route::DeleteList(list.id), &auth.token, None);
        assert_eq!(response.status, 200);
        let ack: DeleteListAck = response.decode().unwrap();
        assert_eq!(ack.list_id, list.id);

        let response = call::<()>(&handler, Route::ListAll, &auth.token, None);
        let lists: Vec<TodoList> = response.decode().unwrap();
        assert!(lists.is_empty());
    }

    #[test]
    fn validation_and_missing_resources() {
        let handler = create_handler();
        let auth = register(&handler, "ada@example.com");

        let body = CreateListRequest { name: " ".into() };
        assert_eq!(call(&handler, Route::CreateList, &auth.token, Some(&body)).status, 400);

        let malformed = ApiRequest {
            body: b"{oops".to_vec(),
            ..ApiRequest::to(Route::CreateList).with_bearer(auth.token.clone())
        };
        assert_eq!(handler.handle(&malformed).status, 400);

        let body = AddItemRequest { text: "x".into() };
        let response = call(&handler, Route::AddItem(ListId::new()), &auth.token, Some(&body));
        assert_eq!(response.status, 404);

        let list = create_list(&handler, &auth.token, "Main");
        let patch = ItemPatch::new().with_completed(true);
        let response = call(
            &handler,
            Route::UpdateItem(list.id, ItemId::new()),
            &auth.token,
            Some(&patch),
        );
        assert_eq!(response.status, 404);
    }

    #[test]
    fn foreign_lists_are_403() {
        let handler = create_handler();
        let owner = register(&handler, "ada@example.com");
        let intruder = register(&handler, "eve@example.com");
        let list = create_list(&handler, &owner.token, "Main");

        let body = AddItemRequest { text: "x".into() };
        let response = call(&handler, Route::AddItem(list.id), &intruder.token, Some(&body));
        assert_eq!(response.status, 403);
        let response = call::<()>(&handler, Route::DeleteList(list.id), &intruder.token, None);
        assert_eq!(response.status, 403);

        let lists: Vec<TodoList> = call::<()>(&handler, Route::ListAll, &intruder.token, None)
            .decode()
            .unwrap();
        assert!(lists.is_empty());
    }

    #[test]
    fn oversized_body_is_rejected() {
        let config = ServerConfig::default().with_max_body_bytes(8);
        let context = HandlerContext::new(config, Arc::new(ManualClock::new(1)));
        let handler = RequestHandler::new(Arc::new(context));

        let request = ApiRequest::to(Route::Register)
            .with_json(&RegisterRequest::new("Ada", "ada@example.com", "pw"))
            .unwrap();
        assert_eq!(handler.handle(&request).status, 400);
    }
}
