//! Server-local lifecycle event ring (bounded to the newest 500 entries).

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use gw_core::SessionId;

pub const MAX_LIFECYCLE_EVENTS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ServerStarted,
    ServerShutdown,
    SessionCreated,
    SessionDisconnected,
    ToolExecuted,
    ProjectActivated,
    ModesChanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    pub timestamp: f64,
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

/// A bounded ring: truncation happens at write time, so readers always see
/// the newest N without needing a seek-by-timestamp API.
pub struct LifecycleLog {
    events: Mutex<VecDeque<LifecycleEvent>>,
}

impl Default for LifecycleLog {
    fn default() -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(MAX_LIFECYCLE_EVENTS)),
        }
    }
}

impl LifecycleLog {
    pub fn push(&self, event: LifecycleEvent) {
        let mut events = self.events.lock();
        events.push_back(event);
        while events.len() > MAX_LIFECYCLE_EVENTS {
            events.pop_front();
        }
    }

    pub fn recent(&self, limit: usize) -> Vec<LifecycleEvent> {
        let events = self.events.lock();
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }

    /// The most recent event of a given type, if any has been recorded.
    pub fn last_of_type(&self, event_type: EventType) -> Option<LifecycleEvent> {
        self.events.lock().iter().rev().find(|e| e.event_type == event_type).cloned()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
