use std::sync::Arc;

use gw_server::server::CentralServer;
use gw_tools::builtin::EchoTool;
use gw_tools::ToolCatalog;

use super::*;

/// Boots a real `gw-server` HTTP API on an OS-assigned loopback port and
/// returns a client pointed at it. Exercises the bridge's client against the
/// actual router rather than a mock, matching how the two processes really talk.
async fn running_server() -> (String, tokio::task::JoinHandle<()>) {
    let mut catalog = ToolCatalog::new();
    catalog.register(Arc::new(EchoTool));
    let server = Arc::new(CentralServer::new(
        "test",
        vec!["interactive".to_string()],
        Arc::new(catalog),
        Arc::new(gw_server::project::FilesystemProjectResolver),
        gw_core::clock::SystemClock,
    ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = gw_server::api::router(server);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn create_and_fetch_session_round_trip() {
    let (url, _server) = running_server().await;
    let client = GatewayClient::new(url);

    let created = client.create_session(Some("alice")).await.unwrap();
    let session_id = created["session_id"].as_str().unwrap().to_string();

    let fetched = client.get_session(&session_id).await.unwrap();
    assert_eq!(fetched["session"]["session_id"], session_id);
}

#[tokio::test]
async fn get_session_on_unknown_id_returns_status_error() {
    let (url, _server) = running_server().await;
    let client = GatewayClient::new(url);

    let err = client.get_session("ghost").await.unwrap_err();
    assert!(matches!(err, GatewayClientError::Status { status, .. } if status == reqwest::StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn call_tool_round_trips_result() {
    let (url, _server) = running_server().await;
    let client = GatewayClient::new(url);

    let created = client.create_session(None).await.unwrap();
    let session_id = created["session_id"].as_str().unwrap();

    let result = client
        .call_tool(session_id, "echo", serde_json::json!({"message": "hi"}), DEFAULT_TOOL_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(result["result"], "hi");
    assert_eq!(result["is_error"], false);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let client = GatewayClient::new("http://127.0.0.1:1");
    let err = client.list_tools().await.unwrap_err();
    assert!(matches!(err, GatewayClientError::Transport { .. }));
}
