use std::sync::Arc;

use gw_core::clock::FakeClock;
use gw_core::session::SessionState;
use gw_tools::builtin::{AlwaysFailsTool, EchoTool};
use gw_tools::ToolCatalog;
use serde_json::json;

use super::*;

fn catalog_with_builtins() -> Arc<ToolCatalog> {
    let mut catalog = ToolCatalog::new();
    catalog.register(Arc::new(EchoTool));
    catalog.register(Arc::new(AlwaysFailsTool));
    Arc::new(catalog)
}

fn server(clock: FakeClock) -> CentralServer<FakeClock> {
    CentralServer::new(
        "test-context",
        vec!["interactive".to_string()],
        catalog_with_builtins(),
        Arc::new(crate::project::FilesystemProjectResolver),
        clock,
    )
}

#[tokio::test]
async fn execute_tool_against_unknown_session_reports_error() {
    let server = server(FakeClock::new());
    let bogus = gw_core::session::SessionId::new("not-a-real-session");
    let result = server.execute_tool(&bogus, "echo", json!({})).await;
    assert!(result.starts_with("Error: Unknown session"));
}

#[tokio::test]
async fn execute_tool_against_disconnected_session_reports_error() {
    let server = server(FakeClock::new());
    let session = server.create_session(Some("alice".to_string()));
    server.disconnect_session(&session.session_id);

    let result = server.execute_tool(&session.session_id, "echo", json!({})).await;
    assert!(result.contains("is disconnected"));
}

#[tokio::test]
async fn execute_tool_unknown_tool_reports_error() {
    let server = server(FakeClock::new());
    let session = server.create_session(None);
    let result = server.execute_tool(&session.session_id, "does-not-exist", json!({})).await;
    assert!(result.starts_with("Error: Unknown tool"));
}

#[tokio::test]
async fn execute_tool_success_increments_counters_and_logs_event() {
    let server = server(FakeClock::new());
    let session = server.create_session(None);

    let result = server
        .execute_tool(&session.session_id, "echo", json!({"message": "hi"}))
        .await;
    assert_eq!(result, "hi");
    assert_eq!(session.tool_call_count(), 1);
    assert_eq!(server.stats().total_tool_calls, 1);

    let events = server.lifecycle_events(10);
    assert!(events
        .iter()
        .any(|e| matches!(e.event_type, EventType::ToolExecuted)));
}

#[tokio::test]
async fn execute_tool_failure_is_mapped_to_error_string_not_propagated() {
    let server = server(FakeClock::new());
    let session = server.create_session(None);

    let result = server.execute_tool(&session.session_id, "always_fails", json!({})).await;
    assert!(result.starts_with("Error: "));
    // Failed calls still count as a call.
    assert_eq!(session.tool_call_count(), 1);
}

#[test]
fn activate_project_updates_session_and_context() {
    let server = server(FakeClock::new());
    let session = server.create_session(None);
    let dir = tempfile::TempDir::new().unwrap();

    let workspace = server
        .activate_project_for_session(&session.session_id, dir.path().to_str().unwrap())
        .unwrap();

    assert_eq!(session.active_project_name(), Some(workspace.name));
    assert_eq!(session.state(), SessionState::Active);
}

#[test]
fn activate_project_unknown_session_errors() {
    let server = server(FakeClock::new());
    let bogus = gw_core::session::SessionId::new("ghost");
    let err = server.activate_project_for_session(&bogus, "/tmp").unwrap_err();
    assert!(matches!(err, ServerError::UnknownSession(_)));
}

#[test]
fn disconnect_session_removes_its_execution_context() {
    let server = server(FakeClock::new());
    let session = server.create_session(None);
    assert!(server.disconnect_session(&session.session_id));
    assert!(!server.disconnect_session(&gw_core::session::SessionId::new("missing")));
}

#[test]
fn list_sessions_reflects_created_sessions() {
    let server = server(FakeClock::new());
    server.create_session(Some("a".to_string()));
    server.create_session(Some("b".to_string()));
    assert_eq!(server.list_sessions().len(), 2);
}

#[test]
fn stats_snapshot_tracks_creation_and_uptime() {
    let clock = FakeClock::new();
    let server = server(clock.clone());
    server.create_session(None);
    clock.advance(std::time::Duration::from_secs(5));

    let stats = server.stats();
    assert_eq!(stats.total_sessions_created, 1);
    assert!(stats.uptime_seconds >= 5.0);
}
