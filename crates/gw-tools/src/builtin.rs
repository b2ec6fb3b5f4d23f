//! Illustrative built-in tools used by the test suite. Production tool
//! implementations (symbol search, code edits, language-server integration)
//! are supplied by the embedding application via [`crate::Tool`].

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ExecutionContext;
use crate::tool::{Tool, ToolError};

/// Read-only: echoes back the `message` argument, prefixed with the active
/// workspace name if one is set. Useful for exercising the dispatch path in
/// tests without a real tool implementation.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes the provided message back to the caller."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"],
        })
    }

    fn can_edit(&self) -> bool {
        false
    }

    async fn execute(&self, ctx: &ExecutionContext, args: Value) -> Result<String, ToolError> {
        let message = args
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::Failed("missing required argument: message".to_string()))?;
        match ctx.active_workspace() {
            Some(ws) => Ok(format!("[{}] {message}", ws.name)),
            None => Ok(message.to_string()),
        }
    }
}

/// Mutating: always fails. Used to exercise the `"Error: ..."` result
/// convention and the `tool_executed{success:false}` lifecycle event.
pub struct AlwaysFailsTool;

#[async_trait]
impl Tool for AlwaysFailsTool {
    fn name(&self) -> &str {
        "always_fails"
    }

    fn description(&self) -> &str {
        "A tool that always raises, for exercising error mapping."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn can_edit(&self) -> bool {
        true
    }

    async fn execute(&self, _ctx: &ExecutionContext, _args: Value) -> Result<String, ToolError> {
        Err(ToolError::Failed("deliberate failure".to_string()))
    }
}

#[cfg(test)]
#[path = "builtin_tests.rs"]
mod tests;
