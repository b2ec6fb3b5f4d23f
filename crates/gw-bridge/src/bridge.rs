//! The bridge's request/response logic, decoupled from the actual stdio
//! streams so it can be driven by in-memory buffers in tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::client::{GatewayClient, DEFAULT_TOOL_TIMEOUT};
use crate::protocol::{self, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, METHOD_NOT_FOUND};

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Translates line-delimited JSON-RPC on stdin into HTTP calls against one
/// `gw-server` session, and writes responses back to stdout.
pub struct McpBridge {
    client: GatewayClient,
    client_name: String,
    session_id: Mutex<Option<String>>,
    tools_cache: Mutex<Option<Value>>,
    tool_timeout: Duration,
    shutdown: Arc<Notify>,
    shutting_down: AtomicBool,
}

impl McpBridge {
    pub fn new(server_url: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            client: GatewayClient::new(server_url),
            client_name: client_name.into(),
            session_id: Mutex::new(None),
            tools_cache: Mutex::new(None),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            shutdown: Arc::new(Notify::new()),
            shutting_down: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.lock().clone()
    }

    /// Reconnects to `existing_id` if supplied and still known to the
    /// server; otherwise (or on any transport failure) creates a fresh
    /// session. Stores the resolved id for the lifetime of the bridge.
    pub async fn connect(&self, existing_id: Option<String>) {
        if let Some(id) = existing_id {
            match self.client.get_session(&id).await {
                Ok(_) => {
                    info!(session_id = %id, "reconnected to existing session");
                    *self.session_id.lock() = Some(id);
                    return;
                }
                Err(e) => {
                    warn!(session_id = %id, error = %e, "could not reconnect, creating a new session");
                }
            }
        }

        match self.client.create_session(Some(&self.client_name)).await {
            Ok(body) => {
                let id = body["session_id"].as_str().unwrap_or_default().to_string();
                info!(session_id = %id, "created session");
                *self.session_id.lock() = Some(id);
            }
            Err(e) => {
                warn!(error = %e, "failed to create session at startup");
            }
        }
    }

    /// Runs the 30s heartbeat loop until `shutdown` is signaled. Heartbeat
    /// failures are logged and never stop the loop.
    pub async fn heartbeat_loop(self: &Arc<Self>) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {}
                _ = self.shutdown.notified() => return,
            }
            if let Some(id) = self.session_id() {
                if let Err(e) = self.client.heartbeat(&id).await {
                    warn!(session_id = %id, error = %e, "heartbeat failed");
                }
            }
        }
    }

    fn stop_heartbeat(&self) {
        self.shutdown.notify_waiters();
    }

    /// Reads line-delimited JSON-RPC from `input`, writes responses to
    /// `output`, until EOF or a fatal read error. Always attempts the
    /// best-effort disconnect on the way out.
    pub async fn run<R, W>(self: &Arc<Self>, input: R, mut output: W)
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break, // EOF
                Err(e) => {
                    warn!(error = %e, "stdin read error, shutting down");
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(req) => req,
                Err(e) => {
                    warn!(error = %e, line, "invalid JSON on stdin, skipping");
                    continue;
                }
            };

            if let Some(response) = self.process_request(request).await {
                if let Ok(text) = serde_json::to_string(&response) {
                    let _ = output.write_all(text.as_bytes()).await;
                    let _ = output.write_all(b"\n").await;
                    let _ = output.flush().await;
                }
            }
        }

        self.disconnect().await;
    }

    async fn process_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "notification, no response sent");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let result: Option<Result<Value, String>> = match request.method.as_str() {
            "initialize" => Some(self.handle_initialize()),
            "tools/list" => Some(self.handle_list_tools().await),
            "tools/call" => Some(self.handle_call_tool(&request.params).await),
            "prompts/get" => Some(self.handle_get_prompt().await),
            "prompts/list" => Some(Ok(serde_json::json!({ "prompts": [] }))),
            "resources/list" => Some(Ok(serde_json::json!({ "resources": [] }))),
            _ => None,
        };

        match result {
            Some(Ok(value)) => Some(JsonRpcResponse::result(id, value)),
            Some(Err(message)) => Some(JsonRpcResponse::error(id, INVALID_PARAMS, message)),
            None => Some(JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", request.method))),
        }
    }

    fn handle_initialize(&self) -> Result<Value, String> {
        Ok(serde_json::json!({
            "protocolVersion": protocol::PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": "gw-bridge", "version": env!("CARGO_PKG_VERSION") },
        }))
    }

    async fn handle_list_tools(&self) -> Result<Value, String> {
        if let Some(cached) = self.tools_cache.lock().clone() {
            return Ok(cached);
        }

        let Some(_session_id) = self.session_id() else {
            return Err("no active session".to_string());
        };

        let body = self
            .client
            .list_tools()
            .await
            .map_err(|e| format!("Proxy error: {e}"))?;

        let tools: Vec<Value> = body["tools"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t["name"],
                    "description": t.get("description").cloned().unwrap_or(Value::String(String::new())),
                    "inputSchema": t.get("parameters").cloned().unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}})),
                })
            })
            .collect();

        let result = serde_json::json!({ "tools": tools });
        *self.tools_cache.lock() = Some(result.clone());
        Ok(result)
    }

    /// Transport failures here never become a JSON-RPC `error` object: the
    /// client would abort the tool call at the protocol layer, which is
    /// wrong for what is really a connectivity problem. They're folded into
    /// a successful result with `isError: true` and a `"Proxy error: ..."` body.
    async fn handle_call_tool(&self, params: &Value) -> Result<Value, String> {
        let name = params.get("name").and_then(Value::as_str);
        let Some(name) = name else {
            return Err("Missing tool name".to_string());
        };
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| serde_json::json!({}));

        let Some(session_id) = self.session_id() else {
            return Ok(protocol::tool_result_content("Proxy error: no active session".to_string(), true));
        };

        match self.client.call_tool(&session_id, name, arguments, self.tool_timeout).await {
            Ok(body) => {
                let text = body["result"].as_str().unwrap_or_default().to_string();
                let is_error = body["is_error"].as_bool().unwrap_or(false);
                Ok(protocol::tool_result_content(text, is_error))
            }
            Err(e) => Ok(protocol::tool_result_content(format!("Proxy error: {e}"), true)),
        }
    }

    async fn handle_get_prompt(&self) -> Result<Value, String> {
        let Some(session_id) = self.session_id() else {
            return Err("no active session".to_string());
        };
        let body = self.client.get_prompt(&session_id).await.map_err(|e| format!("Proxy error: {e}"))?;
        let text = body["prompt"].as_str().unwrap_or_default().to_string();
        Ok(serde_json::json!({
            "description": "System prompt for the gateway",
            "messages": [{ "role": "assistant", "content": { "type": "text", "text": text } }],
        }))
    }

    async fn disconnect(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop_heartbeat();
        if let Some(id) = self.session_id() {
            match tokio::time::timeout(DISCONNECT_TIMEOUT, self.client.delete_session(&id, DISCONNECT_TIMEOUT)).await {
                Ok(Ok(_)) => info!(session_id = %id, "disconnected"),
                Ok(Err(e)) => warn!(session_id = %id, error = %e, "error disconnecting"),
                Err(_) => warn!(session_id = %id, "disconnect timed out"),
            }
        }
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
