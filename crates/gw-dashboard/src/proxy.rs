//! Shared dashboard state and the proxy call every instance route funnels
//! through: resolve the instance, forward the HTTP call, and let the result
//! drive the registry's heartbeat/zombie bookkeeping.

use std::sync::Arc;
use std::time::Duration;

use gw_core::clock::SystemClock;
use gw_registry::{InstanceRegistry, InstanceState, Pid};
use serde_json::{json, Value};

pub const PROXY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct DashboardState {
    pub registry: Arc<InstanceRegistry<SystemClock>>,
    pub http: reqwest::Client,
}

impl DashboardState {
    pub fn new(registry: Arc<InstanceRegistry<SystemClock>>) -> Self {
        Self { registry, http: reqwest::Client::new() }
    }

    /// Forwards `method path` to the instance's own loopback HTTP API.
    /// A successful round-trip refreshes the instance's heartbeat; any
    /// transport failure marks it a zombie. Never returns an `Err` — every
    /// outcome is folded into a JSON body, matching the registry-driven
    /// proxy contract.
    pub async fn proxy_to_instance(&self, pid: Pid, method: reqwest::Method, path: &str, body: Option<Value>) -> Value {
        let instance = match self.registry.get_instance(pid) {
            Ok(Some(inst)) => inst,
            Ok(None) => return json!({ "error": format!("Unknown instance {pid}") }),
            Err(e) => return json!({ "error": format!("registry error: {e}") }),
        };

        if instance.state == InstanceState::Zombie {
            return json!({ "error": format!("Instance {pid} is a zombie (unreachable)") });
        }

        let url = format!("http://127.0.0.1:{}{}", instance.port, path);
        let mut req = self.http.request(method, &url).timeout(PROXY_TIMEOUT);
        if let Some(body) = &body {
            req = req.json(body);
        }

        match req.send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                Ok(value) => {
                    let _ = self.registry.update_heartbeat(pid);
                    value
                }
                Err(e) => json!({ "error": format!("invalid response from instance {pid}: {e}") }),
            },
            Ok(resp) => json!({ "error": format!("instance {pid} returned {}", resp.status()) }),
            Err(e) => {
                let _ = self.registry.mark_zombie(pid);
                json!({ "error": format!("Failed to reach instance {pid}: {e}") })
            }
        }
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
