use std::sync::Arc;

use gw_core::clock::SystemClock;
use gw_registry::InstanceRegistry;
use tempfile::TempDir;

use super::*;

fn new_state() -> (DashboardState, TempDir) {
    let dir = TempDir::new().unwrap();
    let registry = InstanceRegistry::open_in(dir.path(), SystemClock).unwrap();
    (DashboardState::new(Arc::new(registry)), dir)
}

/// A minimal stand-in "instance": an axum app answering `/heartbeat` the way
/// a real `gw-serverd` would, bound to an OS-assigned port.
async fn running_fake_instance() -> (u16, tokio::task::JoinHandle<()>) {
    use axum::routing::get;
    use axum::Router;

    let app = Router::new().route(
        "/echo",
        get(|| async { axum::Json(serde_json::json!({ "ok": true })) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (port, handle)
}

#[tokio::test]
async fn proxy_to_unknown_instance_returns_error_body_not_err() {
    let (state, _dir) = new_state();
    let result = state.proxy_to_instance(9999, reqwest::Method::GET, "/echo", None).await;
    assert!(result["error"].as_str().unwrap().contains("Unknown instance"));
}

#[tokio::test]
async fn proxy_to_zombie_instance_refuses() {
    let (state, _dir) = new_state();
    state.registry.register(1234, 1, None, vec![]).unwrap();
    state.registry.mark_zombie(1234).unwrap();

    let result = state.proxy_to_instance(1234, reqwest::Method::GET, "/echo", None).await;
    assert!(result["error"].as_str().unwrap().contains("zombie"));
}

#[tokio::test]
async fn proxy_success_refreshes_heartbeat() {
    let (state, _dir) = new_state();
    let (port, _server) = running_fake_instance().await;
    state.registry.register(4242, port, None, vec![]).unwrap();
    let before = state.registry.get_instance(4242).unwrap().unwrap().last_heartbeat;

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let result = state.proxy_to_instance(4242, reqwest::Method::GET, "/echo", None).await;
    assert_eq!(result["ok"], true);

    let after = state.registry.get_instance(4242).unwrap().unwrap().last_heartbeat;
    assert!(after >= before);
}

#[tokio::test]
async fn proxy_transport_failure_marks_zombie() {
    let (state, _dir) = new_state();
    state.registry.register(5555, 1, None, vec![]).unwrap();

    let result = state.proxy_to_instance(5555, reqwest::Method::GET, "/echo", None).await;
    assert!(result["error"].is_string());

    let info = state.registry.get_instance(5555).unwrap().unwrap();
    assert_eq!(info.state, InstanceState::Zombie);
}
