use std::sync::Arc;

use gw_server::server::CentralServer;
use gw_tools::builtin::{AlwaysFailsTool, EchoTool};
use gw_tools::ToolCatalog;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::*;

async fn running_server() -> String {
    let mut catalog = ToolCatalog::new();
    catalog.register(Arc::new(EchoTool));
    catalog.register(Arc::new(AlwaysFailsTool));
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
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn run_lines(bridge: &Arc<McpBridge>, input: &str) -> Vec<Value> {
    let (mut in_write, in_read) = tokio::io::duplex(64 * 1024);
    in_write.write_all(input.as_bytes()).await.unwrap();
    drop(in_write);
    let reader = BufReader::new(in_read);

    let (write_half, read_half) = tokio::io::duplex(64 * 1024);

    let collector = tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        let mut out = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            if !line.trim().is_empty() {
                out.push(serde_json::from_str(&line).unwrap());
            }
        }
        out
    });

    bridge.run(reader, write_half).await;
    collector.await.unwrap()
}

#[tokio::test]
async fn notification_without_id_produces_no_output() {
    let url = running_server().await;
    let bridge = Arc::new(McpBridge::new(url, "test-client"));
    bridge.connect(None).await;

    let responses = run_lines(&bridge, "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n").await;
    assert!(responses.is_empty());
}

#[tokio::test]
async fn initialize_returns_static_capability_envelope() {
    let url = running_server().await;
    let bridge = Arc::new(McpBridge::new(url, "test-client"));
    bridge.connect(None).await;

    let responses = run_lines(&bridge, "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\"}\n").await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn unknown_method_is_a_jsonrpc_error() {
    let url = running_server().await;
    let bridge = Arc::new(McpBridge::new(url, "test-client"));
    bridge.connect(None).await;

    let responses = run_lines(&bridge, "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"bogus/method\"}\n").await;
    assert_eq!(responses[0]["error"]["code"], -32601);
}

#[tokio::test]
async fn tools_call_round_trips_through_http() {
    let url = running_server().await;
    let bridge = Arc::new(McpBridge::new(url, "test-client"));
    bridge.connect(None).await;

    let line = serde_json::json!({
        "jsonrpc": "2.0", "id": 7, "method": "tools/call",
        "params": { "name": "echo", "arguments": { "message": "hi" } },
    })
    .to_string();
    let responses = run_lines(&bridge, &format!("{line}\n")).await;

    assert_eq!(responses[0]["result"]["content"][0]["text"], "hi");
    assert_eq!(responses[0]["result"]["isError"], false);
}

#[tokio::test]
async fn tool_failure_is_not_error_is_error_flag_instead() {
    let url = running_server().await;
    let bridge = Arc::new(McpBridge::new(url, "test-client"));
    bridge.connect(None).await;

    let line = serde_json::json!({
        "jsonrpc": "2.0", "id": 3, "method": "tools/call",
        "params": { "name": "always_fails", "arguments": {} },
    })
    .to_string();
    let responses = run_lines(&bridge, &format!("{line}\n")).await;

    assert!(responses[0].get("error").is_none());
    assert_eq!(responses[0]["result"]["isError"], true);
}

#[tokio::test]
async fn transport_failure_becomes_proxy_error_text_not_jsonrpc_error() {
    let bridge = Arc::new(McpBridge::new("http://127.0.0.1:1", "test-client").with_tool_timeout(Duration::from_millis(200)));
    // Deliberately skip connect() so there's no session id: exercises the
    // "no active session" branch, which behaves the same as a dead server.
    let line = serde_json::json!({
        "jsonrpc": "2.0", "id": 9, "method": "tools/call",
        "params": { "name": "echo", "arguments": {} },
    })
    .to_string();
    let responses = run_lines(&bridge, &format!("{line}\n")).await;

    assert!(responses[0].get("error").is_none());
    assert_eq!(responses[0]["result"]["isError"], true);
    assert!(responses[0]["result"]["content"][0]["text"].as_str().unwrap().starts_with("Proxy error"));
}

#[tokio::test]
async fn bridge_reconnects_when_stale_session_id_is_rejected() {
    let url = running_server().await;
    let bridge = Arc::new(McpBridge::new(url, "test-client"));
    bridge.connect(Some("does-not-exist".to_string())).await;

    let line = serde_json::json!({
        "jsonrpc": "2.0", "id": 1, "method": "tools/call",
        "params": { "name": "echo", "arguments": { "message": "ok" } },
    })
    .to_string();
    let responses = run_lines(&bridge, &format!("{line}\n")).await;

    assert_eq!(responses[0]["result"]["content"][0]["text"], "ok");
    assert_eq!(responses[0]["result"]["isError"], false);
}
