//! Host-local, file-locked catalog of gateway processes.
//!
//! Every public operation acquires the advisory file lock, re-reads the
//! document from disk, mutates the in-memory copy, and writes it back
//! atomically (write to a `.tmp` sibling, fsync, then rename). No operation
//! trusts an in-memory cache across calls: the document is the only shared
//! mutable state across processes.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use fs2::FileExt;
use tracing::{info, warn};

use gw_core::clock::{Clock, SystemClock};

use crate::error::RegistryError;
use crate::model::{
    InstanceInfo, InstanceState, LifecycleEvent, LifecycleEventType, Pid, RegistryDocument,
};
use crate::paths::{self, LOCK_FILENAME, REGISTRY_FILENAME};

pub const MAX_LIFECYCLE_EVENTS: usize = 1000;
pub const DEFAULT_ZOMBIE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct InstanceRegistry<C: Clock = SystemClock> {
    registry_path: PathBuf,
    lock_path: PathBuf,
    clock: C,
}

impl InstanceRegistry<SystemClock> {
    /// Opens the registry at the platform-default state directory, creating
    /// it if necessary.
    pub fn open() -> Result<Self, RegistryError> {
        let base_dir = paths::state_dir().ok_or(RegistryError::NoStateDir)?;
        Self::open_in(base_dir, SystemClock)
    }
}

impl<C: Clock> InstanceRegistry<C> {
    pub fn open_in(base_dir: impl Into<PathBuf>, clock: C) -> Result<Self, RegistryError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            registry_path: base_dir.join(REGISTRY_FILENAME),
            lock_path: base_dir.join(LOCK_FILENAME),
            clock,
        })
    }

    fn acquire_lock(&self) -> Result<File, RegistryError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;

        let mut waited = Duration::ZERO;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(file),
                Err(_) if waited < LOCK_TIMEOUT => {
                    std::thread::sleep(LOCK_POLL_INTERVAL);
                    waited += LOCK_POLL_INTERVAL;
                }
                Err(_) => return Err(RegistryError::LockTimeout(LOCK_TIMEOUT)),
            }
        }
    }

    /// Never propagates a parse failure upward: a corrupt or missing
    /// document reads back as empty.
    fn load(&self) -> Result<RegistryDocument, RegistryError> {
        if !self.registry_path.exists() {
            return Ok(RegistryDocument::default());
        }
        let bytes = match fs::read(&self.registry_path) {
            Ok(bytes) => bytes,
            Err(e) => return Err(RegistryError::Io(e)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                warn!(error = %e, "registry document is corrupt, treating as empty");
                Ok(RegistryDocument::default())
            }
        }
    }

    fn save(&self, mut doc: RegistryDocument) -> Result<(), RegistryError> {
        if doc.lifecycle_events.len() > MAX_LIFECYCLE_EVENTS {
            let excess = doc.lifecycle_events.len() - MAX_LIFECYCLE_EVENTS;
            doc.lifecycle_events.drain(0..excess);
        }

        let tmp_path = self.registry_path.with_extension("tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            let bytes = serde_json::to_vec_pretty(&doc)?;
            tmp.write_all(&bytes)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.registry_path)?;
        Ok(())
    }

    fn now(&self) -> f64 {
        self.clock.epoch_ms() as f64 / 1000.0
    }

    fn add_event(
        &self,
        doc: &mut RegistryDocument,
        event_type: LifecycleEventType,
        pid: Pid,
        port: u16,
        project_name: Option<String>,
        message: Option<String>,
    ) {
        doc.lifecycle_events.push(LifecycleEvent {
            timestamp: self.now(),
            event_type,
            pid,
            port,
            project_name,
            message,
        });
    }

    pub fn register(
        &self,
        pid: Pid,
        port: u16,
        context: Option<String>,
        modes: Vec<String>,
    ) -> Result<InstanceInfo, RegistryError> {
        let _lock = self.acquire_lock()?;
        let mut doc = self.load()?;
        let now = self.now();

        let info = match doc.instances.get(&pid).cloned() {
            None => {
                let info = InstanceInfo {
                    pid,
                    port,
                    started_at: now,
                    last_heartbeat: now,
                    context: context.clone(),
                    modes: modes.clone(),
                    project_name: None,
                    project_root: None,
                    state: InstanceState::LiveNoProject,
                    zombie_detected_at: None,
                };
                doc.instances.insert(pid, info.clone());
                self.add_event(
                    &mut doc,
                    LifecycleEventType::InstanceStarted,
                    pid,
                    port,
                    None,
                    Some(format!("context: {context:?}, modes: {modes:?}")),
                );
                info
            }
            Some(mut existing) => {
                existing.port = port;
                existing.last_heartbeat = now;
                existing.context = context;
                existing.modes = modes;
                let was_zombie = existing.state == InstanceState::Zombie;
                if was_zombie {
                    existing.state = InstanceState::LiveNoProject;
                    existing.zombie_detected_at = None;
                }
                doc.instances.insert(pid, existing.clone());
                if was_zombie {
                    self.add_event(
                        &mut doc,
                        LifecycleEventType::HeartbeatRestored,
                        pid,
                        port,
                        None,
                        None,
                    );
                }
                existing
            }
        };

        self.save(doc)?;
        info!(pid, port, "registered instance");
        Ok(info)
    }

    pub fn update_project(
        &self,
        pid: Pid,
        project_name: Option<String>,
        project_root: Option<String>,
    ) -> Result<(), RegistryError> {
        let _lock = self.acquire_lock()?;
        let mut doc = self.load()?;

        let Some(inst) = doc.instances.get_mut(&pid) else {
            return Ok(());
        };

        let old_project = inst.project_name.clone();
        inst.project_name = project_name.clone();
        inst.project_root = project_root;
        inst.last_heartbeat = self.now();

        match &project_name {
            Some(name) if !name.is_empty() => {
                inst.state = InstanceState::LiveWithProject;
                let port = inst.port;
                if old_project.as_deref() != Some(name.as_str()) {
                    self.add_event(
                        &mut doc,
                        LifecycleEventType::ProjectActivated,
                        pid,
                        port,
                        Some(name.clone()),
                        None,
                    );
                }
            }
            _ => {
                inst.state = InstanceState::LiveNoProject;
                let port = inst.port;
                if let Some(old) = old_project {
                    self.add_event(
                        &mut doc,
                        LifecycleEventType::ProjectDeactivated,
                        pid,
                        port,
                        Some(old),
                        None,
                    );
                }
            }
        }

        self.save(doc)
    }

    pub fn update_heartbeat(&self, pid: Pid) -> Result<(), RegistryError> {
        let _lock = self.acquire_lock()?;
        let mut doc = self.load()?;

        let Some(inst) = doc.instances.get_mut(&pid) else {
            return Ok(());
        };
        inst.last_heartbeat = self.now();

        if inst.state == InstanceState::Zombie {
            let restored_state = if inst.project_name.is_some() {
                InstanceState::LiveWithProject
            } else {
                InstanceState::LiveNoProject
            };
            inst.state = restored_state;
            inst.zombie_detected_at = None;
            let port = inst.port;
            let project_name = inst.project_name.clone();
            self.add_event(
                &mut doc,
                LifecycleEventType::HeartbeatRestored,
                pid,
                port,
                project_name,
                None,
            );
        }

        self.save(doc)
    }

    pub fn unregister(&self, pid: Pid) -> Result<(), RegistryError> {
        let _lock = self.acquire_lock()?;
        let mut doc = self.load()?;

        if let Some(inst) = doc.instances.remove(&pid) {
            self.add_event(
                &mut doc,
                LifecycleEventType::InstanceStopped,
                pid,
                inst.port,
                inst.project_name,
                None,
            );
            self.save(doc)?;
        }
        Ok(())
    }

    /// Idempotent: only transitions and emits an event on the first call
    /// after a live state.
    pub fn mark_zombie(&self, pid: Pid) -> Result<(), RegistryError> {
        let _lock = self.acquire_lock()?;
        let mut doc = self.load()?;

        let Some(inst) = doc.instances.get_mut(&pid) else {
            return Ok(());
        };
        if inst.state == InstanceState::Zombie {
            return Ok(());
        }
        inst.state = InstanceState::Zombie;
        inst.zombie_detected_at = Some(self.now());
        let port = inst.port;
        let project_name = inst.project_name.clone();
        self.add_event(
            &mut doc,
            LifecycleEventType::ZombieDetected,
            pid,
            port,
            project_name,
            None,
        );
        self.save(doc)
    }

    pub fn prune_zombies(&self, timeout: Duration) -> Result<Vec<Pid>, RegistryError> {
        let _lock = self.acquire_lock()?;
        let mut doc = self.load()?;
        let now = self.now();
        let timeout_secs = timeout.as_secs_f64();

        let to_remove: Vec<Pid> = doc
            .instances
            .iter()
            .filter(|(_, inst)| {
                inst.state == InstanceState::Zombie
                    && inst
                        .zombie_detected_at
                        .is_some_and(|detected_at| now - detected_at > timeout_secs)
            })
            .map(|(pid, _)| *pid)
            .collect();

        for pid in &to_remove {
            if let Some(inst) = doc.instances.remove(pid) {
                self.add_event(
                    &mut doc,
                    LifecycleEventType::ZombiePruned,
                    *pid,
                    inst.port,
                    inst.project_name,
                    Some(format!("auto-pruned after {}s", timeout.as_secs())),
                );
            }
        }

        if !to_remove.is_empty() {
            self.save(doc)?;
        }
        Ok(to_remove)
    }

    pub fn record_force_kill(&self, pid: Pid, success: bool) -> Result<(), RegistryError> {
        let _lock = self.acquire_lock()?;
        let mut doc = self.load()?;

        let (port, project_name) = doc
            .instances
            .get(&pid)
            .map(|i| (i.port, i.project_name.clone()))
            .unwrap_or((0, None));

        self.add_event(
            &mut doc,
            LifecycleEventType::ZombieForceKilled,
            pid,
            port,
            project_name,
            Some(format!(
                "force kill {}",
                if success { "succeeded" } else { "failed" }
            )),
        );

        if success {
            doc.instances.remove(&pid);
        }

        self.save(doc)
    }

    pub fn list_instances(&self) -> Result<Vec<InstanceInfo>, RegistryError> {
        let _lock = self.acquire_lock()?;
        Ok(self.load()?.instances.into_values().collect())
    }

    pub fn get_instance(&self, pid: Pid) -> Result<Option<InstanceInfo>, RegistryError> {
        let _lock = self.acquire_lock()?;
        Ok(self.load()?.instances.get(&pid).cloned())
    }

    pub fn get_lifecycle_events(&self, limit: usize) -> Result<Vec<LifecycleEvent>, RegistryError> {
        let _lock = self.acquire_lock()?;
        let mut events = self.load()?.lifecycle_events;
        if events.len() > limit {
            events.drain(0..events.len() - limit);
        }
        Ok(events)
    }

    pub fn set_global_dashboard(&self, pid: Pid, port: u16) -> Result<(), RegistryError> {
        let _lock = self.acquire_lock()?;
        let mut doc = self.load()?;
        doc.global_dashboard_pid = Some(pid);
        doc.global_dashboard_port = Some(port);
        self.save(doc)
    }

    pub fn get_global_dashboard_port(&self) -> Result<Option<u16>, RegistryError> {
        let _lock = self.acquire_lock()?;
        Ok(self.load()?.global_dashboard_port)
    }

    /// A no-op unless `pid` matches the stored dashboard pid, so a stale
    /// shutdown from an old dashboard process can't clear a fresh record.
    pub fn clear_global_dashboard(&self, pid: Pid) -> Result<(), RegistryError> {
        let _lock = self.acquire_lock()?;
        let mut doc = self.load()?;
        if doc.global_dashboard_pid == Some(pid) {
            doc.global_dashboard_pid = None;
            doc.global_dashboard_port = None;
            self.save(doc)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
