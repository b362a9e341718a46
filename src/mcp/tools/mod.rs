//! MCP Tools
//!
//! Topic, message, consumer-group and cluster tools. Every handler returns a
//! pretty-printed JSON document; failures become
//! `{"success": false, "error": "..."}` instead of protocol errors.

pub mod cluster;
pub mod groups;
pub mod messages;
pub mod topics;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use super::protocol::ToolsCallResult;
use super::registry::McpRegistry;
use crate::kafka::KafkaOpsError;
use crate::server::metrics;

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut McpRegistry) {
    topics::register_tools(registry);
    messages::register_tools(registry);
    groups::register_tools(registry);
    cluster::register_tools(registry);
}

/// Serializes a successful payload.
pub(crate) fn render<T: Serialize>(value: &T) -> ToolsCallResult {
    ToolsCallResult::json(value).unwrap_or_else(|e| {
        error!("Failed to serialize tool response: {}", e);
        ToolsCallResult::error(r#"{"error": "Failed to serialize response"}"#)
    })
}

/// Error envelope. `context` names the operation and its target, e.g.
/// `Failed to create topic 'orders'`.
pub(crate) fn failure(context: &str, err: &KafkaOpsError) -> ToolsCallResult {
    error!("{}: {}", context, err);
    metrics::record_kafka_error(err.kind());
    let envelope = json!({
        "success": false,
        "error": format!("{}: {}", context, err),
    });
    let mut result = render(&envelope);
    result.is_error = Some(true);
    result
}

pub(crate) fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, KafkaOpsError> {
    // Hosts send `null` or nothing for tools without parameters.
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params).map_err(|e| KafkaOpsError::BadArgument(e.to_string()))
}

pub(crate) fn non_negative(name: &str, value: i64) -> Result<usize, KafkaOpsError> {
    usize::try_from(value)
        .map_err(|_| KafkaOpsError::BadArgument(format!("{} must not be negative, got {}", name, value)))
}

pub(crate) fn to_i32(name: &str, value: i64) -> Result<i32, KafkaOpsError> {
    i32::try_from(value)
        .map_err(|_| KafkaOpsError::BadArgument(format!("{} is out of range: {}", name, value)))
}
