//! Topic Tools
//!
//! Listing, describing, creating and deleting topics.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{failure, parse_params, render, to_i32};
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, ParamKind, RegisteredTool, ToolBuilder, ToolCategory};

/// Register topic tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_topics_tool());
    registry.register_tool(describe_topic_tool());
    registry.register_tool(create_topic_tool());
    registry.register_tool(delete_topic_tool());
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicNameParams {
    topic_name: String,
}

// ============================================================================
// listTopics
// ============================================================================

fn list_topics_tool() -> RegisteredTool {
    ToolBuilder::new("listTopics")
        .description("List all Kafka topics in the cluster. Returns a list of topic names.")
        .category(ToolCategory::Read)
        .build(list_topics_handler)
}

async fn list_topics_handler(ctx: ToolContext, _params: Value) -> ToolsCallResult {
    match ctx.gateway.list_topics().await {
        Ok(topics) => render(&json!({
            "topics": topics,
            "count": topics.len(),
        })),
        Err(e) => failure("Failed to list topics", &e),
    }
}

// ============================================================================
// describeTopic
// ============================================================================

fn describe_topic_tool() -> RegisteredTool {
    ToolBuilder::new("describeTopic")
        .description(
            "Get detailed information about a specific Kafka topic including partitions, \
             replicas, and configurations.",
        )
        .param(
            "topicName",
            ParamKind::String,
            "The name of the topic to describe",
        )
        .category(ToolCategory::Read)
        .build(describe_topic_handler)
}

async fn describe_topic_handler(ctx: ToolContext, params: Value) -> ToolsCallResult {
    let params: TopicNameParams = match parse_params(params) {
        Ok(p) => p,
        Err(e) => return failure("Failed to describe topic", &e),
    };

    match ctx.gateway.describe_topic(&params.topic_name).await {
        Ok(info) => render(&info),
        Err(e) => failure(
            &format!("Failed to describe topic '{}'", params.topic_name),
            &e,
        ),
    }
}

// ============================================================================
// createTopic
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTopicParams {
    topic_name: String,
    #[serde(default = "default_one")]
    partitions: i64,
    #[serde(default = "default_one")]
    replication_factor: i64,
}

fn default_one() -> i64 {
    1
}

fn create_topic_tool() -> RegisteredTool {
    ToolBuilder::new("createTopic")
        .description("Create a new Kafka topic with the specified configuration.")
        .param(
            "topicName",
            ParamKind::String,
            "The name of the topic to create",
        )
        .optional_param(
            "partitions",
            ParamKind::Integer,
            "Number of partitions for the topic (default: 1)",
        )
        .optional_param(
            "replicationFactor",
            ParamKind::Integer,
            "Replication factor for the topic (default: 1)",
        )
        .category(ToolCategory::Write)
        .build(create_topic_handler)
}

async fn create_topic_handler(ctx: ToolContext, params: Value) -> ToolsCallResult {
    let params: CreateTopicParams = match parse_params(params) {
        Ok(p) => p,
        Err(e) => return failure("Failed to create topic", &e),
    };
    let context = format!("Failed to create topic '{}'", params.topic_name);

    let sizes = to_i32("partitions", params.partitions).and_then(|partitions| {
        to_i32("replicationFactor", params.replication_factor).map(|rf| (partitions, rf))
    });
    let (partitions, replication_factor) = match sizes {
        Ok(sizes) => sizes,
        Err(e) => return failure(&context, &e),
    };

    match ctx
        .gateway
        .create_topic(&params.topic_name, partitions, replication_factor)
        .await
    {
        Ok(message) => render(&json!({
            "success": true,
            "message": message,
        })),
        Err(e) => failure(&context, &e),
    }
}

// ============================================================================
// deleteTopic
// ============================================================================

fn delete_topic_tool() -> RegisteredTool {
    ToolBuilder::new("deleteTopic")
        .description(
            "Delete a Kafka topic. WARNING: This operation is irreversible and will delete \
             all messages in the topic.",
        )
        .param(
            "topicName",
            ParamKind::String,
            "The name of the topic to delete",
        )
        .category(ToolCategory::Destructive)
        .build(delete_topic_handler)
}

async fn delete_topic_handler(ctx: ToolContext, params: Value) -> ToolsCallResult {
    let params: TopicNameParams = match parse_params(params) {
        Ok(p) => p,
        Err(e) => return failure("Failed to delete topic", &e),
    };

    match ctx.gateway.delete_topic(&params.topic_name).await {
        Ok(message) => render(&json!({
            "success": true,
            "message": message,
        })),
        Err(e) => failure(
            &format!("Failed to delete topic '{}'", params.topic_name),
            &e,
        ),
    }
}
