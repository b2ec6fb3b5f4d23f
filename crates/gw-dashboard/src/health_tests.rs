use std::sync::Arc;
use std::time::Duration;

use gw_core::clock::SystemClock;
use gw_registry::InstanceRegistry;
use tempfile::TempDir;

use crate::proxy::DashboardState;

use super::*;

fn new_state() -> (DashboardState, TempDir) {
    let dir = TempDir::new().unwrap();
    let registry = InstanceRegistry::open_in(dir.path(), SystemClock).unwrap();
    (DashboardState::new(Arc::new(registry)), dir)
}

async fn running_heartbeat_server() -> (u16, tokio::task::JoinHandle<()>) {
    use axum::routing::get;
    use axum::Router;

    let app = Router::new().route("/heartbeat", get(|| async { axum::Json(serde_json::json!({})) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (port, handle)
}

#[tokio::test]
async fn reachable_instance_stays_live() {
    let (state, _dir) = new_state();
    let (port, _server) = running_heartbeat_server().await;
    state.registry.register(111, port, None, vec![]).unwrap();

    check_instances_once(&state).await;

    let info = state.registry.get_instance(111).unwrap().unwrap();
    assert_eq!(info.state, InstanceState::LiveNoProject);
}

#[tokio::test]
async fn unreachable_instance_becomes_zombie() {
    let (state, _dir) = new_state();
    state.registry.register(222, 1, None, vec![]).unwrap();

    check_instances_once(&state).await;

    let info = state.registry.get_instance(222).unwrap().unwrap();
    assert_eq!(info.state, InstanceState::Zombie);
}

#[tokio::test]
async fn already_zombie_instances_are_not_probed() {
    let (state, _dir) = new_state();
    state.registry.register(333, 1, None, vec![]).unwrap();
    state.registry.mark_zombie(333).unwrap();
    let before = state.registry.get_instance(333).unwrap().unwrap().last_heartbeat;

    check_instances_once(&state).await;

    let after = state.registry.get_instance(333).unwrap().unwrap();
    assert_eq!(after.state, InstanceState::Zombie);
    assert_eq!(after.last_heartbeat, before);
}

#[tokio::test]
async fn prune_loop_removes_old_zombies_after_a_tick() {
    let (state, _dir) = new_state();
    state.registry.register(444, 1, None, vec![]).unwrap();
    state.registry.mark_zombie(444).unwrap();

    let pruned = state.registry.prune_zombies(Duration::from_secs(0)).unwrap();
    assert_eq!(pruned, vec![444]);
    assert!(state.registry.list_instances().unwrap().is_empty());
}
