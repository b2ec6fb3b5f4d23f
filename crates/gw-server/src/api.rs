//! The per-server HTTP API: session CRUD, tool dispatch, and operational
//! endpoints. Every response is JSON; handlers never panic — failures map to
//! an error body instead.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use gw_core::clock::SystemClock;
use gw_core::session::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::server::CentralServer;

pub type SharedServer = Arc<CentralServer<SystemClock>>;

/// Builds the full router: the versioned `/api/*` surface the bridge and
/// operators talk to, plus a bare top-level `/heartbeat` the fleet
/// dashboard's health checker polls directly (mirroring the instance's own
/// loopback probe convention, outside the `/api` namespace).
pub fn router(server: SharedServer) -> Router {
    Router::new()
        .route("/heartbeat", get(root_heartbeat))
        .nest("/api", api_routes())
        .with_state(server)
}

fn api_routes() -> Router<SharedServer> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/lifecycle-events", get(lifecycle_events))
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/{sid}", get(get_session).delete(disconnect_session))
        .route("/sessions/{sid}/heartbeat", post(heartbeat))
        .route("/sessions/{sid}/prompt", get(prompt))
        .route("/sessions/{sid}/modes", put(set_modes))
        .route("/sessions/{sid}/project", put(set_project))
        .route("/tools", get(list_tools))
        .route("/sessions/{sid}/tools/{name}", post(call_tool))
        .route("/projects", get(list_projects))
        .route("/modes", get(list_modes))
        .route("/contexts", get(list_contexts))
        .route("/diagnostics/tool-names", get(diagnostics_tool_names))
        .route("/diagnostics/tool-stats", get(diagnostics_tool_stats))
        .route("/diagnostics/clear-tool-stats", post(diagnostics_clear_tool_stats))
        .route("/diagnostics/log-messages", post(diagnostics_log_messages))
        .route("/diagnostics/queued-executions", get(diagnostics_queued_executions))
        .route("/diagnostics/last-execution", get(diagnostics_last_execution))
        .route("/diagnostics/config-overview", get(diagnostics_config_overview))
        .route("/shutdown", put(shutdown))
}

/// The fleet dashboard's liveness probe: deliberately cheaper than `/api/health`
/// (no body to speak of) so a busy instance still answers it promptly.
async fn root_heartbeat(State(server): State<SharedServer>) -> Json<Value> {
    let _ = &server;
    Json(json!({ "status": "ok" }))
}

fn not_found(message: impl Into<String>) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message.into() }))).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message.into() }))).into_response()
}

async fn health(State(server): State<SharedServer>) -> Json<Value> {
    let _ = &server;
    Json(json!({ "status": "ok", "server": "gw-gateway" }))
}

async fn stats(State(server): State<SharedServer>) -> Json<Value> {
    Json(json!(server.stats()))
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

async fn lifecycle_events(
    State(server): State<SharedServer>,
    Query(q): Query<LimitQuery>,
) -> Json<Value> {
    let events = server.lifecycle_events(q.limit.unwrap_or(100));
    Json(json!({ "events": events }))
}

async fn list_sessions(State(server): State<SharedServer>) -> Json<Value> {
    Json(json!({ "sessions": server.list_sessions() }))
}

#[derive(Deserialize)]
struct CreateSessionBody {
    client_name: Option<String>,
}

async fn create_session(
    State(server): State<SharedServer>,
    body: Option<Json<CreateSessionBody>>,
) -> Json<Value> {
    let client_name = body.and_then(|b| b.0.client_name);
    let session = server.create_session(client_name);
    Json(json!({ "session_id": session.session_id, "status": "created" }))
}

async fn get_session(State(server): State<SharedServer>, Path(sid): Path<String>) -> Response {
    let id = SessionId::new(sid);
    match server.session_details(&id) {
        Some(details) => Json(json!({
            "session": details.info,
            "tool_stats": details.tool_stats,
        }))
        .into_response(),
        None => not_found("Session not found"),
    }
}

async fn disconnect_session(State(server): State<SharedServer>, Path(sid): Path<String>) -> Response {
    let id = SessionId::new(sid);
    if server.disconnect_session(&id) {
        Json(json!({ "status": "disconnected" })).into_response()
    } else {
        not_found("Session not found")
    }
}

async fn heartbeat(State(server): State<SharedServer>, Path(sid): Path<String>) -> Response {
    let id = SessionId::new(sid);
    match server.get_session(&id) {
        Some(session) => {
            session.touch();
            Json(json!({ "status": "ok" })).into_response()
        }
        None => not_found("Session not found"),
    }
}

async fn prompt(State(server): State<SharedServer>, Path(sid): Path<String>) -> Response {
    let id = SessionId::new(sid);
    if server.get_session(&id).is_none() {
        return not_found("Session not found");
    }
    Json(json!({ "prompt": server.system_prompt_for_session(&id) })).into_response()
}

#[derive(Deserialize)]
struct ModesBody {
    modes: Vec<String>,
}

async fn set_modes(
    State(server): State<SharedServer>,
    Path(sid): Path<String>,
    Json(body): Json<ModesBody>,
) -> Response {
    let id = SessionId::new(sid);
    match server.set_modes_for_session(&id, body.modes.clone()) {
        Ok(()) => Json(json!({ "status": "ok", "modes": body.modes })).into_response(),
        Err(_) => not_found("Session not found"),
    }
}

#[derive(Deserialize)]
struct ProjectBody {
    project_path_or_name: String,
}

async fn set_project(
    State(server): State<SharedServer>,
    Path(sid): Path<String>,
    Json(body): Json<ProjectBody>,
) -> Response {
    let id = SessionId::new(sid);
    match server.activate_project_for_session(&id, &body.project_path_or_name) {
        Ok(workspace) => Json(json!({
            "status": "ok",
            "project_name": workspace.name,
            "project_root": workspace.root,
        }))
        .into_response(),
        Err(crate::error::ServerError::UnknownSession(_)) => not_found("Session not found"),
        Err(e) => bad_request(e.to_string()),
    }
}

async fn list_tools(State(server): State<SharedServer>) -> Json<Value> {
    Json(json!({ "tools": server.tool_descriptors() }))
}

#[derive(Deserialize, Default)]
struct CallToolBody {
    #[serde(default)]
    arguments: Value,
}

#[derive(Serialize)]
struct CallToolResponse {
    result: String,
    is_error: bool,
}

async fn call_tool(
    State(server): State<SharedServer>,
    Path((sid, name)): Path<(String, String)>,
    body: Option<Json<CallToolBody>>,
) -> Json<CallToolResponse> {
    let id = SessionId::new(sid);
    let args = body.map(|b| b.0.arguments).unwrap_or(Value::Null);
    let result = server.execute_tool(&id, &name, args).await;
    let is_error = result.starts_with("Error:");
    Json(CallToolResponse { result, is_error })
}

async fn list_projects(State(server): State<SharedServer>) -> Json<Value> {
    let projects: Vec<Value> = server
        .list_sessions()
        .into_iter()
        .filter_map(|s| s.active_project_name.map(|name| json!({ "name": name })))
        .collect();
    Json(json!({ "projects": projects }))
}

async fn list_modes(State(server): State<SharedServer>) -> Json<Value> {
    let modes: HashMap<String, Vec<String>> = server
        .list_sessions()
        .into_iter()
        .map(|s| (s.session_id.to_string(), s.active_modes))
        .collect();
    Json(json!({ "modes": modes }))
}

async fn list_contexts(State(server): State<SharedServer>) -> Json<Value> {
    let _ = &server;
    Json(json!({ "contexts": ["default"] }))
}

async fn diagnostics_tool_names(State(server): State<SharedServer>) -> Json<Value> {
    Json(json!({ "tool_names": server.tool_names() }))
}

async fn diagnostics_tool_stats(State(server): State<SharedServer>) -> Json<Value> {
    Json(json!({ "tool_stats": server.aggregate_tool_stats() }))
}

async fn diagnostics_clear_tool_stats(State(server): State<SharedServer>) -> Json<Value> {
    server.clear_tool_stats();
    Json(json!({ "status": "ok" }))
}

/// Echoes back recent lifecycle events as a stand-in for structured log
/// messages: real log storage is the `tracing` file appender, not something
/// this HTTP surface re-reads.
async fn diagnostics_log_messages(State(server): State<SharedServer>, body: Option<Json<LimitQuery>>) -> Json<Value> {
    let limit = body.and_then(|b| b.0.limit).unwrap_or(100);
    Json(json!({ "messages": server.lifecycle_events(limit) }))
}

/// No job queue exists in this server's scope; always empty.
async fn diagnostics_queued_executions(State(server): State<SharedServer>) -> Json<Value> {
    let _ = &server;
    Json(json!({ "queued_executions": [] }))
}

async fn diagnostics_last_execution(State(server): State<SharedServer>) -> Json<Value> {
    Json(json!({ "last_execution": server.last_tool_execution() }))
}

async fn diagnostics_config_overview(State(server): State<SharedServer>) -> Json<Value> {
    Json(server.config_overview())
}

/// Acknowledges and schedules an out-of-band shutdown; the caller (`main.rs`)
/// exits the process roughly 500ms after the response is sent.
async fn shutdown(State(server): State<SharedServer>) -> Json<Value> {
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        server.shutdown(std::time::Duration::from_secs(10)).await;
        std::process::exit(0);
    });
    Json(json!({ "status": "shutting down" }))
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
