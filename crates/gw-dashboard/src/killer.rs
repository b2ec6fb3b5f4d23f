//! Force-kill path for zombie instances: SIGTERM, a grace period, then
//! SIGKILL if the process is still alive. Always records the outcome in the
//! registry, win or lose.

use std::time::Duration;

use gw_registry::{InstanceRegistry, InstanceState, Pid};
use gw_core::clock::SystemClock;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid as NixPid;
use tracing::{info, warn};

const GRACE_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceKillOutcome {
    NotFound,
    NotZombie,
    Killed,
    Failed,
}

fn is_alive(pid: Pid) -> bool {
    signal::kill(NixPid::from_raw(pid as i32), None).is_ok()
}

/// Refuses to act on anything not currently `ZOMBIE`.
pub async fn force_kill(registry: &InstanceRegistry<SystemClock>, pid: Pid) -> ForceKillOutcome {
    let instance = match registry.get_instance(pid) {
        Ok(Some(inst)) => inst,
        Ok(None) => return ForceKillOutcome::NotFound,
        Err(e) => {
            warn!(pid, error = %e, "registry error while force-killing");
            return ForceKillOutcome::Failed;
        }
    };

    if instance.state != InstanceState::Zombie {
        return ForceKillOutcome::NotZombie;
    }

    let term_result = signal::kill(NixPid::from_raw(pid as i32), Signal::SIGTERM);
    if term_result.is_err() {
        // Already gone: treat as a successful kill.
        let _ = registry.record_force_kill(pid, true);
        return ForceKillOutcome::Killed;
    }

    tokio::time::sleep(GRACE_PERIOD).await;

    let success = if is_alive(pid) {
        match signal::kill(NixPid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) => true,
            Err(e) => {
                warn!(pid, error = %e, "SIGKILL failed");
                false
            }
        }
    } else {
        true
    };

    let _ = registry.record_force_kill(pid, success);
    if success {
        info!(pid, "force-killed zombie instance");
        ForceKillOutcome::Killed
    } else {
        ForceKillOutcome::Failed
    }
}

#[cfg(test)]
#[path = "killer_tests.rs"]
mod tests;
