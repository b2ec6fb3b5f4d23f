//! Keeps this process's row in the shared [`InstanceRegistry`] up to date:
//! registers on startup, heartbeats on an interval, mirrors project
//! activation, and unregisters on shutdown.
//!
//! A background thread (not a tokio task) so it keeps running even if the
//! async runtime is under load; the registry's own I/O is synchronous.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};

use gw_core::clock::SystemClock;
use gw_registry::{InstanceRegistry, Pid};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

struct Signal {
    flag: AtomicBool,
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl Signal {
    fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let _guard = self.mutex.lock().unwrap_or_else(|e| e.into_inner());
        self.condvar.notify_all();
    }

    fn wait_timeout(&self, timeout: Duration) {
        if self.flag.load(Ordering::SeqCst) {
            return;
        }
        let guard = self.mutex.lock().unwrap_or_else(|e| e.into_inner());
        let _ = self.condvar.wait_timeout(guard, timeout);
    }
}

/// Owns this process's registration and the background heartbeat thread.
pub struct RegistrationHandle {
    registry: Arc<InstanceRegistry<SystemClock>>,
    pid: Pid,
    shutdown: Arc<Signal>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl RegistrationHandle {
    /// Registers `pid`/`port` into the registry and spawns the heartbeat
    /// thread. Returns `None` (with a logged warning) if the registry cannot
    /// be opened — registration is best-effort, never fatal to the server.
    pub fn start(context_name: String, modes: Vec<String>, port: u16) -> Option<Arc<Self>> {
        let registry = match InstanceRegistry::open() {
            Ok(r) => Arc::new(r),
            Err(e) => {
                warn!(error = %e, "could not open instance registry, running unregistered");
                return None;
            }
        };

        let pid = std::process::id();
        if let Err(e) = registry.register(pid, port, Some(context_name), modes) {
            warn!(error = %e, "failed to register with instance registry");
            return None;
        }

        let handle = Arc::new(Self {
            registry,
            pid,
            shutdown: Arc::new(Signal::new()),
            thread: Mutex::new(None),
        });

        let worker = Arc::clone(&handle);
        let join = std::thread::spawn(move || worker.heartbeat_loop());
        *handle.thread.lock().unwrap_or_else(|e| e.into_inner()) = Some(join);

        info!(pid, port, "registered with instance registry");
        Some(handle)
    }

    fn heartbeat_loop(&self) {
        while !self.shutdown.flag.load(Ordering::SeqCst) {
            self.shutdown.wait_timeout(HEARTBEAT_INTERVAL);
            if self.shutdown.flag.load(Ordering::SeqCst) {
                break;
            }
            if let Err(e) = self.registry.update_heartbeat(self.pid) {
                warn!(error = %e, "failed to heartbeat instance registry");
            }
        }
    }

    /// Mirrors a project activation/deactivation into the registry row.
    pub fn update_project(&self, name: Option<String>, root: Option<String>) {
        if let Err(e) = self.registry.update_project(self.pid, name, root) {
            warn!(error = %e, "failed to update project in instance registry");
        }
    }

    /// Stops the heartbeat thread and removes this process's row.
    pub fn shutdown(&self) {
        self.shutdown.set();
        if let Some(handle) = self.thread.lock().unwrap_or_else(|e| e.into_inner()).take() {
            let _ = handle.join();
        }
        if let Err(e) = self.registry.unregister(self.pid) {
            warn!(error = %e, "failed to unregister from instance registry");
        }
    }
}

#[cfg(test)]
#[path = "registration_tests.rs"]
mod tests;
