#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gw-dashboard: the fleet dashboard. Aggregates the cross-process
//! `InstanceRegistry`, proxies operational calls to each instance's own HTTP
//! API, and runs the health-check/prune/zombie lifecycle described in the
//! gateway's registry contract.

pub mod api;
pub mod health;
pub mod killer;
pub mod port;
pub mod proxy;

pub use api::router;
pub use proxy::DashboardState;
