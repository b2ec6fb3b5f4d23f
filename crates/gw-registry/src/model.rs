//! On-disk document shape for the instance registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub type Pid = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    LiveNoProject,
    LiveWithProject,
    Zombie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEventType {
    InstanceStarted,
    InstanceStopped,
    ProjectActivated,
    ProjectDeactivated,
    ZombieDetected,
    ZombiePruned,
    ZombieForceKilled,
    HeartbeatRestored,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub timestamp: f64,
    pub event_type: LifecycleEventType,
    pub pid: Pid,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub pid: Pid,
    pub port: u16,
    pub started_at: f64,
    pub last_heartbeat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default)]
    pub modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<String>,
    pub state: InstanceState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zombie_detected_at: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub instances: HashMap<Pid, InstanceInfo>,
    #[serde(default)]
    pub lifecycle_events: Vec<LifecycleEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_dashboard_pid: Option<Pid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_dashboard_port: Option<u16>,
}
