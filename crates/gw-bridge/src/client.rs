//! Thin HTTP client over the `gw-server` API.
//! Every method maps a transport failure into [`GatewayClientError`]; callers
//! decide how to fold that into the JSON-RPC response (see [`crate::bridge`]).

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(300);
const SHORT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum GatewayClientError {
    #[error("cannot reach gateway at {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("gateway at {url} returned {status}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("invalid JSON response from {url}: {source}")]
    InvalidJson { url: String, source: reqwest::Error },
}

/// A connection to one `gw-server` instance, scoped to a single session.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
        timeout: Duration,
    ) -> Result<Value, GatewayClientError> {
        let url = self.api_url(path);
        let mut req = self.http.request(method, &url).timeout(timeout);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req.send().await.map_err(|source| GatewayClientError::Transport { url: url.clone(), source })?;

        if !response.status().is_success() {
            return Err(GatewayClientError::Status { url: url.clone(), status: response.status() });
        }

        response.json().await.map_err(|source| GatewayClientError::InvalidJson { url, source })
    }

    /// `GET /api/sessions/{id}`. Used on startup to probe a supplied session
    /// id before falling back to creating a new one.
    pub async fn get_session(&self, session_id: &str) -> Result<Value, GatewayClientError> {
        self.request(reqwest::Method::GET, &format!("/sessions/{session_id}"), None, SHORT_TIMEOUT).await
    }

    pub async fn create_session(&self, client_name: Option<&str>) -> Result<Value, GatewayClientError> {
        let body = serde_json::json!({ "client_name": client_name });
        self.request(reqwest::Method::POST, "/sessions", Some(body), SHORT_TIMEOUT).await
    }

    pub async fn delete_session(&self, session_id: &str, timeout: Duration) -> Result<Value, GatewayClientError> {
        self.request(reqwest::Method::DELETE, &format!("/sessions/{session_id}"), None, timeout).await
    }

    pub async fn heartbeat(&self, session_id: &str) -> Result<Value, GatewayClientError> {
        self.request(reqwest::Method::POST, &format!("/sessions/{session_id}/heartbeat"), None, SHORT_TIMEOUT).await
    }

    pub async fn list_tools(&self) -> Result<Value, GatewayClientError> {
        self.request(reqwest::Method::GET, "/tools", None, SHORT_TIMEOUT).await
    }

    pub async fn call_tool(
        &self,
        session_id: &str,
        name: &str,
        arguments: Value,
        timeout: Duration,
    ) -> Result<Value, GatewayClientError> {
        let body = serde_json::json!({ "arguments": arguments });
        self.request(reqwest::Method::POST, &format!("/sessions/{session_id}/tools/{name}"), Some(body), timeout)
            .await
    }

    pub async fn get_prompt(&self, session_id: &str) -> Result<Value, GatewayClientError> {
        self.request(reqwest::Method::GET, &format!("/sessions/{session_id}/prompt"), None, SHORT_TIMEOUT).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
