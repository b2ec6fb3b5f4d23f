#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gw-server: the centralized multi-session gateway. Owns a `SessionManager`,
//! a per-session `ExecutionContext` map, and the HTTP API through which the
//! stdio bridge and operators talk to it.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod project;
pub mod registration;
pub mod server;
pub mod stats;

pub use api::{router, SharedServer};
pub use config::ServerConfig;
pub use error::ServerError;
pub use server::CentralServer;
