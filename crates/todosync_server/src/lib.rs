//! # todosync server
//!
//! Authoritative server for multi-list todo state.
//!
//! This crate provides:
//! - The auth gate (HMAC-SHA256 bearer credentials, Argon2 passwords)
//! - The list/item store with ownership checks
//! - The ordering engine that keeps priority items in front
//! - A request handler mapping routes to store operations
//! - An HTTP listener that binds the first free candidate port
//!
//! # Architecture
//!
//! The server is the single source of truth. Every mutating call returns
//! the complete list as stored, and clients replace their copy with it.
//! Only the store runs the ordering engine, and only when an item's
//! priority flag actually flips.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use todosync_server::{http, ServerConfig, TodoServer};
//!
//! let config = ServerConfig::default();
//! let listener = http::bind(&config.endpoint).await?;
//! let server = Arc::new(TodoServer::new(config)?);
//! http::serve(server, listener).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod auth;
mod clock;
mod config;
mod error;
mod handler;
pub mod http;
pub mod ordering;
mod password;
mod server;
mod snapshot;
mod store;
mod users;

pub use auth::{AuthConfig, TokenValidator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use server::TodoServer;
pub use snapshot::Snapshot;
pub use store::ListStore;
pub use users::{User, UserRegistry};
