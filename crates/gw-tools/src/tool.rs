//! The narrow interface through which externally-supplied tool
//! implementations (symbol search, code edits, language-server integration,
//! ...) plug into the gateway. Those implementations are out of scope here;
//! this crate only defines the contract and a couple of illustrative
//! built-ins used by the test suite.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::context::ExecutionContext;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Failed(String),
}

/// A catalog entry describing a tool's name, prose, and JSON-schema
/// parameters, as returned by `GET /api/tools`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub can_edit: bool,
}

/// An externally-supplied capability invoked by name with a JSON argument
/// map, returning a string result. Implementations must catch their own
/// panics/errors internally where feasible; `execute` returning `Err` is
/// still mapped to an `"Error: ..."` string by the caller, never propagated
/// as a protocol-level failure.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;

    /// Whether this tool can mutate the workspace. Read-only tools may run
    /// against the template context as a fallback; mutating tools must not.
    fn can_edit(&self) -> bool;

    async fn execute(&self, ctx: &ExecutionContext, args: Value) -> Result<String, ToolError>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
            can_edit: self.can_edit(),
        }
    }
}
