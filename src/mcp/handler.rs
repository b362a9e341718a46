//! MCP Message Dispatch
//!
//! Turns one JSON-RPC message into at most one response. The SSE transport
//! owns delivery; this module only knows about the protocol.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::context::ToolContext;
use super::protocol::{
    methods, InitializeParams, InitializeResult, McpError, McpRequest, McpResponse, PingResult,
    ServerCapabilities, ServerInfo, ToolsCallParams, ToolsCapability, ToolsListResult,
    JSONRPC_VERSION, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use super::registry::McpRegistry;
use crate::server::metrics;

/// State shared across MCP sessions
pub struct McpState {
    pub registry: Arc<McpRegistry>,
}

/// Handle a single MCP message. `initialized` is the per-session lifecycle
/// flag; tools are only reachable once it is set.
pub async fn handle_message(
    text: &str,
    ctx: ToolContext,
    mcp_state: &McpState,
    initialized: &mut bool,
) -> Option<McpResponse> {
    let request: McpRequest = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(e) => {
            return Some(McpResponse::error(
                None,
                McpError::ParseError(e.to_string()),
            ));
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return Some(McpResponse::error(
            request.id,
            McpError::InvalidRequest(format!("Unsupported jsonrpc version {}", request.jsonrpc)),
        ));
    }

    if request.is_notification() {
        handle_notification(&request);
        return None;
    }
    let request_id = request.id.clone()?;

    let result = match request.method.as_str() {
        methods::INITIALIZE => handle_initialize(&request, initialized),
        methods::PING => handle_ping(),
        methods::TOOLS_LIST => {
            if !*initialized {
                Err(McpError::InvalidRequest("Not initialized".to_string()))
            } else {
                handle_tools_list(mcp_state)
            }
        }
        methods::TOOLS_CALL => {
            if !*initialized {
                Err(McpError::InvalidRequest("Not initialized".to_string()))
            } else {
                handle_tools_call(&request, ctx, mcp_state).await
            }
        }
        methods::SHUTDOWN => Ok(json!({})),
        other => Err(McpError::MethodNotFound(other.to_string())),
    };

    Some(match result {
        Ok(value) => McpResponse::success(request_id, value),
        Err(error) => McpResponse::error(Some(request_id), error),
    })
}

fn handle_notification(request: &McpRequest) {
    match request.method.as_str() {
        methods::INITIALIZED => debug!("Client finished initialization"),
        methods::CANCELLED => {
            // Running tools are not interrupted.
            debug!("Client cancelled a request: {:?}", request.params)
        }
        other => debug!("Ignoring notification {}", other),
    }
}

fn handle_initialize(request: &McpRequest, initialized: &mut bool) -> Result<Value, McpError> {
    let params: Option<InitializeParams> = request
        .params
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?;

    if let Some(params) = &params {
        info!(
            "MCP client {} {} connected (protocol {})",
            params.client_info.name, params.client_info.version, params.protocol_version
        );
    }

    *initialized = true;

    let result = InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: None }),
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: super::context::server_version(),
        },
    };

    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

fn handle_ping() -> Result<Value, McpError> {
    serde_json::to_value(PingResult {}).map_err(|e| McpError::InternalError(e.to_string()))
}

fn handle_tools_list(mcp_state: &McpState) -> Result<Value, McpError> {
    let result = ToolsListResult {
        tools: mcp_state.registry.list_tools(),
    };

    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

async fn handle_tools_call(
    request: &McpRequest,
    ctx: ToolContext,
    mcp_state: &McpState,
) -> Result<Value, McpError> {
    let params: ToolsCallParams = request
        .params
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;

    let tool = mcp_state
        .registry
        .get_tool(&params.name)
        .ok_or_else(|| McpError::MethodNotFound(format!("Unknown tool: {}", params.name)))?;

    let arguments = params.arguments.unwrap_or(json!({}));
    let start = Instant::now();
    let result = (tool.handler)(ctx, arguments).await;

    let outcome = if result.is_failure() { "error" } else { "success" };
    if result.is_failure() {
        error!("Tool {} ({}) failed", tool.name, tool.category.as_str());
    }
    metrics::record_tool_call(&tool.name, outcome, start.elapsed());

    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

/// Create the MCP state with registered tools
pub fn create_mcp_state() -> McpState {
    let mut registry = McpRegistry::new();

    super::tools::register_all_tools(&mut registry);

    info!("MCP registry initialized with {} tools", registry.tool_count());

    McpState {
        registry: Arc::new(registry),
    }
}
