//! `CentralServer`: owns one `SessionManager`, a per-session
//! `ExecutionContext` map, and the server's lifecycle event log. Routes
//! tool calls and exposes the data the HTTP layer (`api.rs`) serializes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{info, warn};

use gw_core::clock::{Clock, SystemClock};
use gw_core::session::{SessionId, SessionInfo, SessionState};
use gw_core::session_manager::SessionManager;
use gw_tools::{ExecutionContext, Tool, ToolCatalog, ToolDescriptor};
use parking_lot::Mutex;

use crate::error::ServerError;
use crate::events::{EventType, LifecycleEvent, LifecycleLog};
use crate::project::{ProjectError, ProjectResolver};
use crate::registration::RegistrationHandle;
use crate::stats::{ServerStats, ServerStatsSnapshot};

pub struct SessionDetails {
    pub info: SessionInfo,
    pub tool_stats: HashMap<String, u64>,
}

pub struct CentralServer<C: Clock = SystemClock> {
    started_at: f64,
    context_name: String,
    default_modes: Vec<String>,
    clock: C,
    session_manager: Arc<SessionManager<C>>,
    contexts: Mutex<HashMap<SessionId, Arc<ExecutionContext>>>,
    template_context: Arc<ExecutionContext>,
    catalog: Arc<ToolCatalog>,
    project_resolver: Arc<dyn ProjectResolver>,
    stats: Mutex<ServerStats>,
    events: LifecycleLog,
    registration: Mutex<Option<Arc<RegistrationHandle>>>,
}

impl<C: Clock> CentralServer<C> {
    pub fn new(
        context_name: impl Into<String>,
        default_modes: Vec<String>,
        catalog: Arc<ToolCatalog>,
        project_resolver: Arc<dyn ProjectResolver>,
        clock: C,
    ) -> Self {
        let session_manager = Arc::new(SessionManager::new(clock.clone()));
        let context_name = context_name.into();
        let server = Self {
            started_at: clock.epoch_ms() as f64 / 1000.0,
            context_name: context_name.clone(),
            default_modes: default_modes.clone(),
            clock,
            session_manager,
            contexts: Mutex::new(HashMap::new()),
            template_context: Arc::new(ExecutionContext::new(catalog.clone())),
            catalog,
            project_resolver,
            stats: Mutex::new(ServerStats::default()),
            events: LifecycleLog::default(),
            registration: Mutex::new(None),
        };
        server.events.push(LifecycleEvent {
            timestamp: server.now(),
            event_type: EventType::ServerStarted,
            session_id: None,
            details: json!({ "context": context_name, "modes": default_modes }),
        });
        server
    }

    fn now(&self) -> f64 {
        self.clock.epoch_ms() as f64 / 1000.0
    }

    pub fn session_manager(&self) -> &Arc<SessionManager<C>> {
        &self.session_manager
    }

    /// Attaches this server to the cross-process instance registry. Called
    /// once at startup after the HTTP listener's port is known.
    pub fn attach_registration(&self, handle: Arc<RegistrationHandle>) {
        *self.registration.lock() = Some(handle);
    }

    pub fn tool_descriptors(&self) -> Vec<ToolDescriptor> {
        self.catalog.descriptors()
    }

    /// Creates a session plus its dedicated execution context, fully
    /// isolated from every other session's.
    pub fn create_session(&self, client_name: Option<String>) -> Arc<gw_core::Session<C>> {
        let session = self.session_manager.create_session(client_name.clone());
        session.set_active_modes(self.default_modes.clone());

        let ctx = Arc::new(ExecutionContext::new(self.catalog.clone()));
        self.contexts.lock().insert(session.session_id.clone(), ctx);

        self.stats.lock().total_sessions_created += 1;
        self.events.push(LifecycleEvent {
            timestamp: self.now(),
            event_type: EventType::SessionCreated,
            session_id: Some(session.session_id.clone()),
            details: json!({ "client_name": client_name }),
        });

        info!(session_id = %session.session_id, "created session");
        session
    }

    pub fn get_session(&self, id: &SessionId) -> Option<Arc<gw_core::Session<C>>> {
        self.session_manager.get_session(id)
    }

    pub fn disconnect_session(&self, id: &SessionId) -> bool {
        let Some(_session) = self.session_manager.get_session(id) else {
            return false;
        };

        if let Some(ctx) = self.contexts.lock().remove(id) {
            ctx.shutdown();
        }
        self.session_manager.disconnect_session(id);

        self.events.push(LifecycleEvent {
            timestamp: self.now(),
            event_type: EventType::SessionDisconnected,
            session_id: Some(id.clone()),
            details: Value::Null,
        });
        true
    }

    fn context_for(&self, id: &SessionId, tool: &dyn Tool) -> Option<Arc<ExecutionContext>> {
        if let Some(ctx) = self.contexts.lock().get(id).cloned() {
            return Some(ctx);
        }
        if tool.can_edit() {
            // Mutating tools must never silently run against the template
            // context: the caller (execute_tool) treats this as an error.
            None
        } else {
            warn!(session_id = %id, "no execution context for session, using template");
            Some(self.template_context.clone())
        }
    }

    /// Resolves the session, dispatches the tool, and always returns a
    /// string: tool failures are mapped to an `"Error: ..."` result rather
    /// than propagated, matching the bridge/HTTP contract.
    pub async fn execute_tool(&self, session_id: &SessionId, tool_name: &str, args: Value) -> String {
        let Some(session) = self.session_manager.get_session(session_id) else {
            return format!("Error: Unknown session {session_id}");
        };

        if session.state() == SessionState::Disconnected {
            return format!("Error: Session {session_id} is disconnected");
        }

        let Some(tool) = self.catalog.get(tool_name) else {
            return format!("Error: Unknown tool {tool_name}");
        };

        let ctx = match self.context_for(session_id, tool.as_ref()) {
            Some(ctx) => ctx,
            None => {
                warn!(session_id = %session_id, tool = tool_name, "no execution context for mutating tool");
                return format!("Error: No execution context for session {session_id}");
            }
        };

        session.increment_tool_calls(Some(tool_name));
        self.stats.lock().total_tool_calls += 1;

        let result = tool.execute(&ctx, args).await;
        let (text, success) = match result {
            Ok(text) => (text, true),
            Err(e) => (format!("Error: {e}"), false),
        };

        self.events.push(LifecycleEvent {
            timestamp: self.now(),
            event_type: EventType::ToolExecuted,
            session_id: Some(session_id.clone()),
            details: json!({ "tool_name": tool_name, "success": success }),
        });

        text
    }

    pub fn activate_project_for_session(
        &self,
        session_id: &SessionId,
        path_or_name: &str,
    ) -> Result<gw_tools::Workspace, ServerError> {
        let session = self
            .session_manager
            .get_session(session_id)
            .ok_or_else(|| ServerError::UnknownSession(session_id.clone()))?;

        let workspace = self
            .project_resolver
            .resolve(path_or_name)
            .map_err(|ProjectError::NotFound(p)| ServerError::UnknownWorkspace(p))?;

        if let Some(ctx) = self.contexts.lock().get(session_id) {
            ctx.set_active_workspace(Some(workspace.clone()));
        }
        session.set_active_project(Some(workspace.name.clone()), Some(workspace.root.clone()));

        if let Some(reg) = self.registration.lock().clone() {
            reg.update_project(Some(workspace.name.clone()), Some(workspace.root.clone()));
        }

        self.events.push(LifecycleEvent {
            timestamp: self.now(),
            event_type: EventType::ProjectActivated,
            session_id: Some(session_id.clone()),
            details: json!({ "project_name": workspace.name, "project_root": workspace.root }),
        });

        Ok(workspace)
    }

    pub fn set_modes_for_session(&self, session_id: &SessionId, modes: Vec<String>) -> Result<(), ServerError> {
        let session = self
            .session_manager
            .get_session(session_id)
            .ok_or_else(|| ServerError::UnknownSession(session_id.clone()))?;

        if let Some(ctx) = self.contexts.lock().get(session_id) {
            ctx.set_active_modes(modes.clone());
        }
        session.set_active_modes(modes.clone());

        self.events.push(LifecycleEvent {
            timestamp: self.now(),
            event_type: EventType::ModesChanged,
            session_id: Some(session_id.clone()),
            details: json!({ "modes": modes }),
        });
        Ok(())
    }

    /// Minimal, pluggable-tool-agnostic system prompt: real prompt
    /// composition is an external collaborator's concern.
    pub fn system_prompt_for_session(&self, session_id: &SessionId) -> String {
        let modes = self
            .session_manager
            .get_session(session_id)
            .map(|s| s.active_modes())
            .unwrap_or_else(|| self.default_modes.clone());
        format!(
            "Gateway ready. context={} modes={:?} tools={}",
            self.context_name,
            modes,
            self.catalog.len()
        )
    }

    pub fn list_sessions(&self) -> Vec<SessionInfo> {
        self.session_manager.list_session_infos()
    }

    pub fn session_details(&self, session_id: &SessionId) -> Option<SessionDetails> {
        let session = self.session_manager.get_session(session_id)?;
        Some(SessionDetails {
            info: session.info(),
            tool_stats: session.tool_stats(),
        })
    }

    pub fn stats(&self) -> ServerStatsSnapshot {
        let stats = self.stats.lock();
        ServerStatsSnapshot {
            started_at: self.started_at,
            uptime_seconds: self.now() - self.started_at,
            total_sessions_created: stats.total_sessions_created,
            total_tool_calls: stats.total_tool_calls,
            active_session_count: self.session_manager.active_session_count(),
        }
    }

    pub fn lifecycle_events(&self, limit: usize) -> Vec<LifecycleEvent> {
        self.events.recent(limit)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.catalog.descriptors().into_iter().map(|d| d.name).collect()
    }

    /// Sums every session's per-tool counters into one process-wide view,
    /// the diagnostic the fleet dashboard's "tool stats" proxy route shows.
    pub fn aggregate_tool_stats(&self) -> HashMap<String, u64> {
        let mut totals: HashMap<String, u64> = HashMap::new();
        for session in self.session_manager.list_sessions() {
            for (name, count) in session.tool_stats() {
                *totals.entry(name).or_insert(0) += count;
            }
        }
        totals
    }

    pub fn clear_tool_stats(&self) {
        for session in self.session_manager.list_sessions() {
            session.reset_tool_stats();
        }
    }

    pub fn last_tool_execution(&self) -> Option<LifecycleEvent> {
        self.events.last_of_type(EventType::ToolExecuted)
    }

    pub fn config_overview(&self) -> Value {
        json!({
            "context": self.context_name,
            "default_modes": self.default_modes,
            "tool_count": self.catalog.len(),
        })
    }
}

impl CentralServer<SystemClock> {
    /// Best-effort, timeout-split shutdown: half the budget for per-session
    /// contexts, half for the template context. Never panics or propagates.
    pub async fn shutdown(&self, timeout: Duration) {
        info!("shutting down central server");
        self.events.push(LifecycleEvent {
            timestamp: self.now(),
            event_type: EventType::ServerShutdown,
            session_id: None,
            details: Value::Null,
        });

        let half = timeout / 2;
        let contexts: Vec<_> = self.contexts.lock().drain().map(|(_, ctx)| ctx).collect();
        let _ = tokio::time::timeout(half, async {
            for ctx in contexts {
                ctx.shutdown();
            }
        })
        .await;

        self.session_manager.shutdown();

        let _ = tokio::time::timeout(half, async {
            self.template_context.shutdown();
        })
        .await;

        if let Some(reg) = self.registration.lock().take() {
            reg.shutdown();
        }

        info!("central server shutdown complete");
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
