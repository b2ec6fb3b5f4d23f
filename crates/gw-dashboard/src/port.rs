//! Picks the loopback port the fleet dashboard listens on, avoiding a
//! double-start when another process's dashboard is already serving.

use std::time::Duration;

use gw_registry::InstanceRegistry;
use gw_core::clock::SystemClock;
use tokio::net::TcpListener;

const PROBE_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_PORT_SCAN_ATTEMPTS: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDecision {
    /// No dashboard is running; bind this port and start one.
    Start(u16),
    /// A dashboard is already answering on this port; reuse it.
    AlreadyRunning(u16),
}

/// Checks whether `port` is answering the global-dashboard probe endpoint.
async fn is_dashboard(client: &reqwest::Client, port: u16) -> bool {
    let url = format!("http://127.0.0.1:{port}/global-dashboard/api/instances");
    match client.get(&url).timeout(PROBE_TIMEOUT).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

async fn first_free_port(start_port: u16) -> Option<u16> {
    let mut port = start_port;
    for _ in 0..MAX_PORT_SCAN_ATTEMPTS {
        if TcpListener::bind(("127.0.0.1", port)).await.is_ok() {
            return Some(port);
        }
        port = port.checked_add(1)?;
    }
    None
}

/// Prefer a registry record that's still answering; otherwise try the
/// preferred port and scan upward only if something else (not a dashboard)
/// is already bound there.
pub async fn choose_port(
    registry: &InstanceRegistry<SystemClock>,
    client: &reqwest::Client,
    preferred_port: u16,
) -> Result<PortDecision, gw_registry::RegistryError> {
    if let Some(existing_port) = registry.get_global_dashboard_port()? {
        if is_dashboard(client, existing_port).await {
            return Ok(PortDecision::AlreadyRunning(existing_port));
        }
    }

    if TcpListener::bind(("127.0.0.1", preferred_port)).await.is_ok() {
        return Ok(PortDecision::Start(preferred_port));
    }

    if is_dashboard(client, preferred_port).await {
        return Ok(PortDecision::AlreadyRunning(preferred_port));
    }

    match first_free_port(preferred_port + 1).await {
        Some(port) => Ok(PortDecision::Start(port)),
        None => Ok(PortDecision::Start(preferred_port)),
    }
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
