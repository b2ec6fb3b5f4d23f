//! Background workers driving the zombie lifecycle: a health checker that
//! probes every non-zombie instance's `/heartbeat`, and a pruner that
//! removes zombies that have been unreachable past the timeout.

use std::time::Duration;

use gw_registry::InstanceState;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::proxy::DashboardState;

pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(5);
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);
pub const PRUNE_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Probes every known non-zombie instance's `/heartbeat` once. Exposed
/// separately from the loop so tests can drive a single pass deterministically.
pub async fn check_instances_once(state: &DashboardState) {
    let instances = match state.registry.list_instances() {
        Ok(instances) => instances,
        Err(e) => {
            warn!(error = %e, "failed to list instances for health check");
            return;
        }
    };

    for instance in instances {
        if instance.state == InstanceState::Zombie {
            continue;
        }

        let url = format!("http://127.0.0.1:{}/heartbeat", instance.port);
        let result = state.http.get(&url).timeout(HEALTH_CHECK_TIMEOUT).send().await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                if let Err(e) = state.registry.update_heartbeat(instance.pid) {
                    warn!(pid = instance.pid, error = %e, "failed to record heartbeat");
                }
            }
            _ => {
                debug!(pid = instance.pid, "instance unreachable, marking zombie");
                if let Err(e) = state.registry.mark_zombie(instance.pid) {
                    warn!(pid = instance.pid, error = %e, "failed to mark zombie");
                }
            }
        }
    }
}

pub async fn health_check_loop(state: DashboardState, shutdown: std::sync::Arc<Notify>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(HEALTH_CHECK_INTERVAL) => {}
            _ = shutdown.notified() => return,
        }
        check_instances_once(&state).await;
    }
}

pub async fn prune_loop(state: DashboardState, timeout: Duration, shutdown: std::sync::Arc<Notify>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(PRUNE_CHECK_INTERVAL) => {}
            _ = shutdown.notified() => return,
        }
        match state.registry.prune_zombies(timeout) {
            Ok(pruned) if !pruned.is_empty() => info!(?pruned, "pruned zombie instances"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to prune zombies"),
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
