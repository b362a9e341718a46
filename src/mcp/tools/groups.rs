//! Consumer Group Tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::{failure, parse_params, render};
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, ParamKind, RegisteredTool, ToolBuilder, ToolCategory};

/// Register consumer group tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_consumer_groups_tool());
    registry.register_tool(describe_consumer_group_tool());
}

fn list_consumer_groups_tool() -> RegisteredTool {
    ToolBuilder::new("listConsumerGroups")
        .description("List all consumer groups in the Kafka cluster.")
        .category(ToolCategory::Read)
        .build(list_consumer_groups_handler)
}

async fn list_consumer_groups_handler(ctx: ToolContext, _params: Value) -> ToolsCallResult {
    match ctx.gateway.list_consumer_groups().await {
        Ok(groups) => render(&json!({
            "consumerGroups": groups,
            "count": groups.len(),
        })),
        Err(e) => failure("Failed to list consumer groups", &e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupIdParams {
    group_id: String,
}

fn describe_consumer_group_tool() -> RegisteredTool {
    ToolBuilder::new("describeConsumerGroup")
        .description(
            "Get detailed information about a consumer group including members and their \
             partition assignments.",
        )
        .param(
            "groupId",
            ParamKind::String,
            "The consumer group ID to describe",
        )
        .category(ToolCategory::Read)
        .build(describe_consumer_group_handler)
}

async fn describe_consumer_group_handler(ctx: ToolContext, params: Value) -> ToolsCallResult {
    let params: GroupIdParams = match parse_params(params) {
        Ok(p) => p,
        Err(e) => return failure("Failed to describe consumer group", &e),
    };

    match ctx.gateway.describe_consumer_group(&params.group_id).await {
        Ok(info) => render(&info),
        Err(e) => failure(
            &format!("Failed to describe consumer group '{}'", params.group_id),
            &e,
        ),
    }
}
