#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gw-bridge: the stdio↔HTTP transport adapter. Reads line-delimited
//! JSON-RPC 2.0 from stdin, forwards it as HTTP to a `gw-server` instance,
//! and writes responses to stdout.

pub mod bridge;
pub mod client;
pub mod protocol;

pub use bridge::McpBridge;
pub use client::{GatewayClient, GatewayClientError};
