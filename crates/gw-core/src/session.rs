//! Per-client session state and the manager that owns all live sessions.
//!
//! Mirrors the concurrency shape of the Python original: a single reentrant
//! lock guards every field of a session so that nested calls (e.g. a mutator
//! that also reads `state` to decide what to do) don't deadlock.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::define_id;

define_id! {
    /// Opaque 128-bit-shaped session identifier.
    pub struct SessionId;
}

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(300);
pub const DISCONNECTED_RETENTION: Duration = Duration::from_secs(3600);
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Connected,
    Active,
    Idle,
    Disconnected,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Connected => "connected",
            SessionState::Active => "active",
            SessionState::Idle => "idle",
            SessionState::Disconnected => "disconnected",
        };
        write!(f, "{s}")
    }
}

/// Serializable snapshot of a session, suitable for an HTTP response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub client_name: Option<String>,
    pub created_at: u64,
    pub last_activity: u64,
    pub state: SessionState,
    pub active_project_name: Option<String>,
    pub active_project_root: Option<String>,
    pub active_modes: Vec<String>,
    pub tool_call_count: u64,
}

struct SessionInner {
    raw_state: SessionState,
    last_activity_ms: u64,
    active_project_name: Option<String>,
    active_project_root: Option<String>,
    active_modes: Vec<String>,
    tool_call_count: u64,
    tool_stats: HashMap<String, u64>,
}

/// A single connected client's isolated state.
///
/// All field access goes through the reentrant lock, matching the
/// `threading.RLock` discipline of the system this was ported from: a
/// mutator is free to call another method on `self` without deadlocking.
pub struct Session<C: Clock = SystemClock> {
    pub session_id: SessionId,
    pub client_name: Option<String>,
    pub created_at: u64,
    clock: C,
    inner: ReentrantMutex<RefCell<SessionInner>>,
}

impl<C: Clock> Session<C> {
    pub fn new(session_id: SessionId, client_name: Option<String>, clock: C) -> Self {
        let now = clock.epoch_ms();
        Self {
            session_id,
            client_name,
            created_at: now,
            clock,
            inner: ReentrantMutex::new(RefCell::new(SessionInner {
                raw_state: SessionState::Connected,
                last_activity_ms: now,
                active_project_name: None,
                active_project_root: None,
                active_modes: Vec::new(),
                tool_call_count: 0,
                tool_stats: HashMap::new(),
            })),
        }
    }

    /// The derived state: auto-promotes CONNECTED/ACTIVE to IDLE on read if
    /// there has been no activity for `IDLE_TIMEOUT`. Never persisted.
    pub fn state(&self) -> SessionState {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        self.derived_state(&inner)
    }

    fn derived_state(&self, inner: &SessionInner) -> SessionState {
        if matches!(inner.raw_state, SessionState::Connected | SessionState::Active) {
            let elapsed_ms = self.clock.epoch_ms().saturating_sub(inner.last_activity_ms);
            if elapsed_ms > IDLE_TIMEOUT.as_millis() as u64 {
                return SessionState::Idle;
            }
        }
        inner.raw_state
    }

    /// The sole writer of `last_activity`. Every mutator below calls this.
    pub fn touch(&self) {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        let now = self.clock.epoch_ms();
        // Monotonic: never move the timestamp backwards.
        inner.last_activity_ms = inner.last_activity_ms.max(now);
    }

    pub fn set_active_project(&self, name: Option<String>, root: Option<String>) {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        inner.active_project_name = name.clone();
        inner.active_project_root = root;
        inner.raw_state = if name.is_some() {
            SessionState::Active
        } else {
            SessionState::Connected
        };
        drop(inner);
        drop(guard);
        self.touch();
    }

    pub fn active_project_name(&self) -> Option<String> {
        let guard = self.inner.lock();
        guard.borrow().active_project_name.clone()
    }

    pub fn set_active_modes(&self, modes: Vec<String>) {
        {
            let guard = self.inner.lock();
            guard.borrow_mut().active_modes = modes;
        }
        self.touch();
    }

    pub fn active_modes(&self) -> Vec<String> {
        let guard = self.inner.lock();
        guard.borrow().active_modes.clone()
    }

    /// Increments total and per-tool counters. Called concurrently from many
    /// threads in the isolation test; must never lose an update.
    pub fn increment_tool_calls(&self, tool_name: Option<&str>) {
        {
            let guard = self.inner.lock();
            let mut inner = guard.borrow_mut();
            inner.tool_call_count += 1;
            if let Some(name) = tool_name {
                *inner.tool_stats.entry(name.to_string()).or_insert(0) += 1;
            }
        }
        self.touch();
    }

    pub fn tool_call_count(&self) -> u64 {
        let guard = self.inner.lock();
        guard.borrow().tool_call_count
    }

    /// Zeroes the total and per-tool counters, for the diagnostics
    /// "clear stats" operation. Does not otherwise touch session state.
    pub fn reset_tool_stats(&self) {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        inner.tool_call_count = 0;
        inner.tool_stats.clear();
    }

    pub fn tool_stats(&self) -> HashMap<String, u64> {
        let guard = self.inner.lock();
        guard.borrow().tool_stats.clone()
    }

    pub fn disconnect(&self) {
        {
            let guard = self.inner.lock();
            guard.borrow_mut().raw_state = SessionState::Disconnected;
        }
        self.touch();
    }

    pub fn last_activity_ms(&self) -> u64 {
        let guard = self.inner.lock();
        guard.borrow().last_activity_ms
    }

    pub fn info(&self) -> SessionInfo {
        let guard = self.inner.lock();
        let inner = guard.borrow();
        SessionInfo {
            session_id: self.session_id.clone(),
            client_name: self.client_name.clone(),
            created_at: self.created_at,
            last_activity: inner.last_activity_ms,
            state: self.derived_state(&inner),
            active_project_name: inner.active_project_name.clone(),
            active_project_root: inner.active_project_root.clone(),
            active_modes: inner.active_modes.clone(),
            tool_call_count: inner.tool_call_count,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
