//! Cluster Tools

use serde_json::Value;

use super::{failure, render};
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolCategory};

/// Register cluster tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(describe_cluster_tool());
}

fn describe_cluster_tool() -> RegisteredTool {
    ToolBuilder::new("describeCluster")
        .description(
            "Get information about the Kafka cluster including broker details and controller.",
        )
        .category(ToolCategory::Read)
        .build(describe_cluster_handler)
}

async fn describe_cluster_handler(ctx: ToolContext, _params: Value) -> ToolsCallResult {
    match ctx.gateway.describe_cluster().await {
        Ok(info) => render(&info),
        Err(e) => failure("Failed to describe cluster", &e),
    }
}
