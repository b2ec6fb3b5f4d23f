//! The fleet dashboard's HTTP surface, under `/global-dashboard/api`: the
//! registry-backed instance list, the lifecycle event log, per-instance
//! proxy routes, and the force-kill endpoint.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use gw_registry::Pid;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::killer::{force_kill, ForceKillOutcome};
use crate::proxy::DashboardState;

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/global-dashboard/api/instances", get(list_instances))
        .route("/global-dashboard/api/lifecycle-events", get(lifecycle_events))
        .route("/global-dashboard/api/instance/{pid}/logs", post(proxy_logs))
        .route("/global-dashboard/api/instance/{pid}/tool-names", get(proxy_tool_names))
        .route("/global-dashboard/api/instance/{pid}/tool-stats", get(proxy_tool_stats))
        .route("/global-dashboard/api/instance/{pid}/clear-tool-stats", post(proxy_clear_tool_stats))
        .route("/global-dashboard/api/instance/{pid}/config-overview", get(proxy_config_overview))
        .route("/global-dashboard/api/instance/{pid}/queued-executions", get(proxy_queued_executions))
        .route("/global-dashboard/api/instance/{pid}/last-execution", get(proxy_last_execution))
        .route("/global-dashboard/api/instance/{pid}/shutdown", put(proxy_shutdown))
        .route("/global-dashboard/api/instance/{pid}/force-kill", post(force_kill_instance))
        .with_state(state)
}

async fn list_instances(State(state): State<DashboardState>) -> Json<Value> {
    let mut instances = state.registry.list_instances().unwrap_or_default();
    instances.sort_by(|a, b| a.started_at.total_cmp(&b.started_at));
    Json(json!({ "instances": instances }))
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

async fn lifecycle_events(State(state): State<DashboardState>, Query(q): Query<LimitQuery>) -> Json<Value> {
    let events = state.registry.get_lifecycle_events(q.limit.unwrap_or(100)).unwrap_or_default();
    Json(json!({ "events": events }))
}

async fn proxy_logs(State(state): State<DashboardState>, Path(pid): Path<Pid>, body: Option<Json<Value>>) -> Json<Value> {
    let body = body.map(|b| b.0);
    Json(state.proxy_to_instance(pid, reqwest::Method::POST, "/api/diagnostics/log-messages", body).await)
}

async fn proxy_tool_names(State(state): State<DashboardState>, Path(pid): Path<Pid>) -> Json<Value> {
    Json(state.proxy_to_instance(pid, reqwest::Method::GET, "/api/diagnostics/tool-names", None).await)
}

async fn proxy_tool_stats(State(state): State<DashboardState>, Path(pid): Path<Pid>) -> Json<Value> {
    Json(state.proxy_to_instance(pid, reqwest::Method::GET, "/api/diagnostics/tool-stats", None).await)
}

async fn proxy_clear_tool_stats(State(state): State<DashboardState>, Path(pid): Path<Pid>) -> Json<Value> {
    Json(state.proxy_to_instance(pid, reqwest::Method::POST, "/api/diagnostics/clear-tool-stats", None).await)
}

async fn proxy_last_execution(State(state): State<DashboardState>, Path(pid): Path<Pid>) -> Json<Value> {
    Json(state.proxy_to_instance(pid, reqwest::Method::GET, "/api/diagnostics/last-execution", None).await)
}

async fn proxy_config_overview(State(state): State<DashboardState>, Path(pid): Path<Pid>) -> Json<Value> {
    Json(state.proxy_to_instance(pid, reqwest::Method::GET, "/api/diagnostics/config-overview", None).await)
}

async fn proxy_queued_executions(State(state): State<DashboardState>, Path(pid): Path<Pid>) -> Json<Value> {
    Json(state.proxy_to_instance(pid, reqwest::Method::GET, "/api/diagnostics/queued-executions", None).await)
}

/// Proxies the shutdown call, then unregisters the instance regardless of
/// whether the instance gets the chance to unregister itself.
async fn proxy_shutdown(State(state): State<DashboardState>, Path(pid): Path<Pid>) -> Json<Value> {
    let result = state.proxy_to_instance(pid, reqwest::Method::PUT, "/api/shutdown", None).await;
    let _ = state.registry.unregister(pid);
    Json(result)
}

async fn force_kill_instance(State(state): State<DashboardState>, Path(pid): Path<Pid>) -> Json<Value> {
    let outcome = force_kill(&state.registry, pid).await;
    let body = match outcome {
        ForceKillOutcome::Killed => json!({ "ok": true }),
        ForceKillOutcome::NotFound => json!({ "ok": false, "error": "Unknown instance" }),
        ForceKillOutcome::NotZombie => json!({ "ok": false, "error": "Can only force-kill zombie instances" }),
        ForceKillOutcome::Failed => json!({ "ok": false, "error": "force-kill failed" }),
    };
    Json(body)
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
