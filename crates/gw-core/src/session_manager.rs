//! Owns every live [`Session`] for one gateway process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex as StdMutex};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::session::{Session, SessionId, SessionInfo, SessionState, CLEANUP_INTERVAL, DISCONNECTED_RETENTION};

/// A park/notify pair used so the cleanup thread can be woken early on shutdown
/// instead of always sleeping the full interval, mirroring `threading.Event.wait`.
struct ShutdownSignal {
    flag: AtomicBool,
    mutex: StdMutex<()>,
    condvar: Condvar,
}

impl ShutdownSignal {
    fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
            mutex: StdMutex::new(()),
            condvar: Condvar::new(),
        }
    }

    fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let _guard = self.mutex.lock().unwrap_or_else(|e| e.into_inner());
        self.condvar.notify_all();
    }

    fn wait_timeout(&self, timeout: Duration) {
        if self.is_set() {
            return;
        }
        let guard = self.mutex.lock().unwrap_or_else(|e| e.into_inner());
        let _ = self.condvar.wait_timeout(guard, timeout);
    }
}

pub struct SessionManager<C: Clock = SystemClock> {
    sessions: Mutex<HashMap<SessionId, Arc<Session<C>>>>,
    clock: C,
    shutdown: Arc<ShutdownSignal>,
    cleanup_thread: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Clock> SessionManager<C> {
    pub fn new(clock: C) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
            shutdown: Arc::new(ShutdownSignal::new()),
            cleanup_thread: Mutex::new(None),
        }
    }

    pub fn create_session(&self, client_name: Option<String>) -> Arc<Session<C>> {
        let id = SessionId::new(uuid::Uuid::new_v4().to_string());
        let session = Arc::new(Session::new(id.clone(), client_name.clone(), self.clock.clone()));
        self.sessions.lock().insert(id.clone(), session.clone());
        info!(session_id = %id, client_name = ?client_name, "created session");
        session
    }

    pub fn get_session(&self, id: &SessionId) -> Option<Arc<Session<C>>> {
        self.sessions.lock().get(id).cloned()
    }

    pub fn list_sessions(&self) -> Vec<Arc<Session<C>>> {
        self.sessions.lock().values().cloned().collect()
    }

    pub fn list_session_infos(&self) -> Vec<SessionInfo> {
        self.sessions.lock().values().map(|s| s.info()).collect()
    }

    pub fn get_active_sessions(&self) -> Vec<Arc<Session<C>>> {
        self.sessions
            .lock()
            .values()
            .filter(|s| s.state() != SessionState::Disconnected)
            .cloned()
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions
            .lock()
            .values()
            .filter(|s| s.state() != SessionState::Disconnected)
            .count()
    }

    /// Remove a session immediately, disconnecting it first.
    pub fn remove_session(&self, id: &SessionId) -> bool {
        let removed = {
            let mut sessions = self.sessions.lock();
            if let Some(session) = sessions.get(id) {
                session.disconnect();
                sessions.remove(id);
                true
            } else {
                false
            }
        };
        if removed {
            info!(session_id = %id, "removed session");
        }
        removed
    }

    /// Mark a session disconnected, retaining it for post-mortem inspection
    /// until the reaper collects it.
    pub fn disconnect_session(&self, id: &SessionId) -> bool {
        let found = self.sessions.lock().get(id).cloned();
        match found {
            Some(session) => {
                session.disconnect();
                info!(session_id = %id, "disconnected session");
                true
            }
            None => false,
        }
    }

    fn cleanup_old_sessions(&self) -> usize {
        let now = self.clock.epoch_ms();
        let retention_ms = DISCONNECTED_RETENTION.as_millis() as u64;
        let mut sessions = self.sessions.lock();
        let to_remove: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, s)| {
                s.state() == SessionState::Disconnected
                    && now.saturating_sub(s.last_activity_ms()) > retention_ms
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in &to_remove {
            sessions.remove(id);
            debug!(session_id = %id, "reaped old disconnected session");
        }
        to_remove.len()
    }
}

impl SessionManager<SystemClock> {
    /// Spawns the background reaper. No-op (with a warning) if already running.
    pub fn start_cleanup_thread(self: &Arc<Self>) {
        let mut guard = self.cleanup_thread.lock();
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                warn!("cleanup thread already running");
                return;
            }
        }
        let manager = Arc::clone(self);
        let shutdown = Arc::clone(&self.shutdown);
        let handle = std::thread::spawn(move || {
            debug!("session cleanup thread started");
            while !shutdown.is_set() {
                let cleaned = manager.cleanup_old_sessions();
                if cleaned > 0 {
                    info!(count = cleaned, "cleaned up old sessions");
                }
                shutdown.wait_timeout(CLEANUP_INTERVAL);
            }
            debug!("session cleanup thread stopped");
        });
        *guard = Some(handle);
    }

    /// Disconnects every session and joins the reaper (capped at 5s).
    pub fn shutdown(&self) {
        info!("shutting down session manager");
        self.shutdown.set();

        for session in self.sessions.lock().values() {
            session.disconnect();
        }

        if let Some(handle) = self.cleanup_thread.lock().take() {
            let (tx, rx) = std::sync::mpsc::channel();
            let _ = std::thread::spawn(move || {
                let _ = tx.send(handle.join());
            });
            let _ = rx.recv_timeout(Duration::from_secs(5));
        }
    }
}

#[cfg(test)]
#[path = "session_manager_tests.rs"]
mod tests;
