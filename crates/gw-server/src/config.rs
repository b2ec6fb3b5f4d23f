//! Environment-driven server configuration. File-based config parsing is an
//! external collaborator's concern; the gateway only reads env vars.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONTEXT_NAME: &str = "gw-gateway";
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub context_name: String,
    pub default_modes: Vec<String>,
    pub log_path: PathBuf,
    pub shutdown_timeout: Duration,
    /// When set, the server registers and heartbeats itself into the shared
    /// instance registry.
    pub registry_enabled: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("GW_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:0".to_string()),
            context_name: std::env::var("GW_CONTEXT_NAME").unwrap_or_else(|_| DEFAULT_CONTEXT_NAME.to_string()),
            default_modes: std::env::var("GW_DEFAULT_MODES")
                .ok()
                .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
                .unwrap_or_else(|| vec!["interactive".to_string()]),
            log_path: log_path(),
            shutdown_timeout: std::env::var("GW_SHUTDOWN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
            registry_enabled: std::env::var("GW_DISABLE_REGISTRY").is_err(),
        }
    }
}

fn log_path() -> PathBuf {
    let base = gw_registry::paths::state_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("gw-server.log")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
