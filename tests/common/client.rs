//! HTTP and MCP clients for end-to-end tests
//!
//! `TestClient` wraps reqwest for plain HTTP calls. `McpSession` holds an open
//! SSE stream and drives the JSON-RPC exchange over it: POST a message, then
//! read the reply from the stream.
//!
//! When routes or the wire format change, update only this file.

use super::constants::*;
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    // ========================================================================
    // Plain HTTP
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// POST a raw body to `path_and_query`
    pub async fn post_raw(&self, path_and_query: &str, body: &str) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path_and_query))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed")
    }

    // ========================================================================
    // MCP
    // ========================================================================

    /// Opens an SSE session on `sse_path` and reads the endpoint event
    ///
    /// # Panics
    ///
    /// Panics if the stream can't be opened or the first event isn't `endpoint`.
    pub async fn open_session(&self, sse_path: &str) -> McpSession {
        // No overall timeout: the stream stays open for the whole test.
        let stream_client = reqwest::Client::new();
        let response = stream_client
            .get(format!("{}{}", self.base_url, sse_path))
            .header("accept", "text/event-stream")
            .send()
            .await
            .expect("SSE request failed");
        assert_eq!(response.status(), StatusCode::OK);

        let mut session = McpSession {
            http: TestClient::new(self.base_url.clone()),
            stream: response,
            buffer: String::new(),
            endpoint: String::new(),
            next_id: 1,
        };

        let event = session.next_event().await;
        assert_eq!(event.event, "endpoint", "first SSE event must be endpoint");
        session.endpoint = event.data;
        session
    }

    /// Opens a session and completes the initialize handshake
    pub async fn initialized_session(&self, sse_path: &str) -> McpSession {
        let mut session = self.open_session(sse_path).await;
        let result = session.initialize().await;
        assert_eq!(result["result"]["protocolVersion"], "2024-11-05");
        session
    }
}

/// One server-sent event
#[derive(Debug, Clone, Default)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// An open MCP session over SSE
pub struct McpSession {
    http: TestClient,
    stream: Response,
    buffer: String,
    /// Path and query advertised by the `endpoint` event
    pub endpoint: String,
    next_id: i64,
}

impl McpSession {
    /// The session id embedded in the endpoint
    pub fn session_id(&self) -> &str {
        self.endpoint
            .split("sessionId=")
            .nth(1)
            .expect("endpoint carries no sessionId")
    }

    /// Reads the next non-comment event from the stream
    pub async fn next_event(&mut self) -> SseEvent {
        let deadline = Duration::from_millis(SSE_EVENT_TIMEOUT_MS);
        tokio::time::timeout(deadline, self.read_event())
            .await
            .expect("Timed out waiting for SSE event")
    }

    async fn read_event(&mut self) -> SseEvent {
        loop {
            while let Some(end) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(..end + 2).collect();
                if let Some(event) = parse_event(&block) {
                    return event;
                }
            }

            let chunk = self
                .stream
                .chunk()
                .await
                .expect("SSE stream failed")
                .expect("SSE stream ended");
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }

    /// POSTs a message to the session endpoint without reading the reply
    pub async fn post(&self, message: &Value) -> Response {
        self.http.post_raw(&self.endpoint, &message.to_string()).await
    }

    /// Sends a request and returns the JSON-RPC response from the stream
    ///
    /// # Panics
    ///
    /// Panics if the POST isn't accepted or the reply id doesn't match.
    pub async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;

        let response = self
            .post(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let event = self.next_event().await;
        assert_eq!(event.event, "message");
        let reply: Value = serde_json::from_str(&event.data).expect("Reply is not JSON");
        assert_eq!(reply["id"], id);
        reply
    }

    pub async fn initialize(&mut self) -> Value {
        let reply = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "e2e-tests", "version": "1.0"}
                }),
            )
            .await;

        let response = self
            .post(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        reply
    }

    /// Calls a tool and returns the `result` object (content plus isError)
    pub async fn call_tool_result(&mut self, name: &str, arguments: Value) -> Value {
        let reply = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await;
        assert!(
            reply.get("error").is_none(),
            "tools/call {} returned a protocol error: {}",
            name,
            reply
        );
        reply["result"].clone()
    }

    /// Calls a tool and parses its JSON text payload
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        let result = self.call_tool_result(name, arguments).await;
        let text = result["content"][0]["text"]
            .as_str()
            .expect("Tool result has no text content");
        serde_json::from_str(text).expect("Tool payload is not JSON")
    }
}

fn parse_event(block: &str) -> Option<SseEvent> {
    let mut event = SseEvent::default();
    let mut data_lines = Vec::new();

    for line in block.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("event:") {
            event.event = value.trim_start().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
    }

    if event.event.is_empty() && data_lines.is_empty() {
        return None;
    }
    if event.event.is_empty() {
        event.event = "message".to_string();
    }
    event.data = data_lines.join("\n");
    Some(event)
}
