use super::*;
use crate::catalog::ToolCatalog;
use std::sync::Arc;

#[tokio::test]
async fn echo_tool_reflects_workspace_name() {
    let ctx = ExecutionContext::new(Arc::new(ToolCatalog::new()));
    ctx.set_active_workspace(Some(crate::workspace::Workspace::new("proj", "/tmp/proj")));
    let tool = EchoTool;
    let result = tool.execute(&ctx, json!({"message": "hi"})).await.unwrap();
    assert_eq!(result, "[proj] hi");
}

#[tokio::test]
async fn echo_tool_without_workspace_passes_message_through() {
    let ctx = ExecutionContext::new(Arc::new(ToolCatalog::new()));
    let tool = EchoTool;
    let result = tool.execute(&ctx, json!({"message": "hi"})).await.unwrap();
    assert_eq!(result, "hi");
}

#[tokio::test]
async fn echo_tool_requires_message() {
    let ctx = ExecutionContext::new(Arc::new(ToolCatalog::new()));
    let tool = EchoTool;
    let err = tool.execute(&ctx, json!({})).await.unwrap_err();
    assert!(matches!(err, ToolError::Failed(_)));
}

#[tokio::test]
async fn always_fails_tool_returns_err() {
    let ctx = ExecutionContext::new(Arc::new(ToolCatalog::new()));
    let tool = AlwaysFailsTool;
    assert!(tool.execute(&ctx, json!({})).await.is_err());
}
