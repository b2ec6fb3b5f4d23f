//! Per-session execution context: the bundle of resources a tool call runs
//! against.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::catalog::ToolCatalog;
use crate::tool::Tool;
use crate::workspace::Workspace;

pub struct ExecutionContext {
    catalog: Arc<ToolCatalog>,
    workspace: RwLock<Option<Workspace>>,
    modes: RwLock<Vec<String>>,
    shut_down: AtomicBool,
}

impl ExecutionContext {
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self {
            catalog,
            workspace: RwLock::new(None),
            modes: RwLock::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    pub fn resolve_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.catalog.get(name)
    }

    pub fn active_workspace(&self) -> Option<Workspace> {
        self.workspace.read().clone()
    }

    pub fn set_active_workspace(&self, workspace: Option<Workspace>) {
        *self.workspace.write() = workspace;
    }

    pub fn active_modes(&self) -> Vec<String> {
        self.modes.read().clone()
    }

    pub fn set_active_modes(&self, modes: Vec<String>) {
        *self.modes.write() = modes;
    }

    /// Best-effort and idempotent: a second call is a silent no-op, and any
    /// internal failure is logged rather than surfaced.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.set_active_workspace(None);
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
