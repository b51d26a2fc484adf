//! # todosync protocol
//!
//! Wire types shared by the todosync server and client.
//!
//! This crate provides:
//! - `TodoList` / `TodoItem` documents and the partial `ItemPatch`
//! - Request and response bodies for the user and list endpoints
//! - The `Route` table, so both sides agree on method + path
//! - `EndpointConfig`, the single candidate-port set used by the server
//!   when binding and by the client when probing
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod endpoint;
mod error;
mod exchange;
mod ids;
mod messages;
mod model;
mod routes;

pub use endpoint::{
    parse_port, parse_port_list, EndpointConfig, DEFAULT_FALLBACK_PORTS, DEFAULT_PORT,
};
pub use error::{ProtocolError, ProtocolResult};
pub use exchange::{ApiRequest, ApiResponse, ApiService};
pub use ids::{ItemId, ListId, UserId};
pub use messages::{
    AddItemRequest, AuthResponse, CreateListRequest, DeleteListAck, ErrorBody, Liveness,
    LoginRequest, Profile, RegisterRequest, LIVENESS_MESSAGE,
};
pub use model::{ItemPatch, TodoItem, TodoList};
pub use routes::{Method, Route};
