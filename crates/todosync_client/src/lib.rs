//! # todosync client
//!
//! Client for the todosync server.
//!
//! This crate provides:
//! - Endpoint discovery over a fixed candidate set, memoized until a
//!   connectivity failure
//! - Typed API calls over an abstract [`HttpClient`]
//! - [`TodoClient`], which keeps the signed-in user's lists and replaces a
//!   list wholesale with every server response
//!
//! ## Key Invariants
//!
//! - Server is authoritative; local lists are never edited optimistically
//! - Each user intent makes exactly one remote call
//! - A failed call leaves local state unchanged
//!
//! ```rust,ignore
//! use todosync_client::{ClientConfig, ReqwestClient, TodoClient};
//!
//! let client = TodoClient::new(ClientConfig::default(), ReqwestClient::new()?);
//! client.login("ada@example.com", "secret").await?;
//! let id = client.add_item("buy milk").await?;
//! client.toggle_priority(id).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod api;
mod client;
mod config;
mod error;
mod http;
mod resolver;

pub use api::TodoApi;
pub use client::{ClientStats, TodoClient};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, LoopbackClient, ReqwestClient};
pub use resolver::EndpointResolver;
