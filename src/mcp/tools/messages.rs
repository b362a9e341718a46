//! Message Tools
//!
//! Producing records and bounded, non-committing reads.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use super::{failure, non_negative, parse_params, render, to_i32};
use crate::kafka::{ConsumeRequest, KafkaOpsError, PeekRequest, ProduceRequest};
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, ParamKind, RegisteredTool, ToolBuilder, ToolCategory};

/// Register message tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(produce_message_tool());
    registry.register_tool(consume_messages_tool());
    registry.register_tool(peek_messages_tool());
}

// ============================================================================
// produceMessage
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProduceParams {
    topic_name: String,
    message: String,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    headers_json: Option<String>,
}

/// Parses the `headersJson` argument. Absent or blank means no headers.
fn parse_headers(raw: Option<&str>) -> Result<BTreeMap<String, String>, KafkaOpsError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(BTreeMap::new()),
        Some(text) => serde_json::from_str(text).map_err(|e| {
            KafkaOpsError::BadArgument(format!(
                "headersJson must be a JSON object of string values: {}",
                e
            ))
        }),
    }
}

fn produce_message_tool() -> RegisteredTool {
    ToolBuilder::new("produceMessage")
        .description(
            "Send a message to a Kafka topic. Returns the partition and offset where the \
             message was written.",
        )
        .param(
            "topicName",
            ParamKind::String,
            "The topic to send the message to",
        )
        .param(
            "message",
            ParamKind::String,
            "The message value/payload to send",
        )
        .optional_param(
            "key",
            ParamKind::String,
            "Optional message key for partitioning",
        )
        .optional_param(
            "headersJson",
            ParamKind::String,
            "Optional headers as JSON object (e.g., {\"header1\": \"value1\"})",
        )
        .category(ToolCategory::Write)
        .build(produce_message_handler)
}

async fn produce_message_handler(ctx: ToolContext, params: Value) -> ToolsCallResult {
    let params: ProduceParams = match parse_params(params) {
        Ok(p) => p,
        Err(e) => return failure("Failed to produce message", &e),
    };
    let headers = match parse_headers(params.headers_json.as_deref()) {
        Ok(headers) => headers,
        Err(e) => return failure("Failed to produce message", &e),
    };

    let result = ctx
        .gateway
        .produce_message(ProduceRequest {
            topic: params.topic_name,
            key: params.key,
            value: Some(params.message),
            headers,
        })
        .await;

    render(&result)
}

// ============================================================================
// consumeMessages
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConsumeParams {
    topic_name: String,
    #[serde(default = "default_max_messages")]
    max_messages: i64,
    #[serde(default = "default_from_beginning")]
    from_beginning: bool,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: i64,
}

fn default_max_messages() -> i64 {
    10
}

fn default_from_beginning() -> bool {
    true
}

fn default_timeout_seconds() -> i64 {
    10
}

fn consume_messages_tool() -> RegisteredTool {
    ToolBuilder::new("consumeMessages")
        .description(
            "Consume messages from a Kafka topic. Creates a temporary consumer group to read \
             messages.",
        )
        .param(
            "topicName",
            ParamKind::String,
            "The topic to consume messages from",
        )
        .optional_param(
            "maxMessages",
            ParamKind::Integer,
            "Maximum number of messages to consume (default: 10)",
        )
        .optional_param(
            "fromBeginning",
            ParamKind::Boolean,
            "Whether to read from the beginning of the topic (default: true)",
        )
        .optional_param(
            "timeoutSeconds",
            ParamKind::Integer,
            "Timeout in seconds to wait for messages (default: 10)",
        )
        .category(ToolCategory::Read)
        .build(consume_messages_handler)
}

fn consume_request(params: ConsumeParams) -> Result<ConsumeRequest, KafkaOpsError> {
    let max_messages = non_negative("maxMessages", params.max_messages)?;
    let timeout_seconds = non_negative("timeoutSeconds", params.timeout_seconds)?;
    Ok(ConsumeRequest {
        topic: params.topic_name,
        max_messages,
        from_beginning: params.from_beginning,
        timeout: Duration::from_secs(timeout_seconds as u64),
    })
}

async fn consume_messages_handler(ctx: ToolContext, params: Value) -> ToolsCallResult {
    let params: ConsumeParams = match parse_params(params) {
        Ok(p) => p,
        Err(e) => return failure("Failed to consume messages", &e),
    };
    let request = match consume_request(params) {
        Ok(request) => request,
        Err(e) => return failure("Failed to consume messages", &e),
    };
    let topic = request.topic.clone();

    match ctx.gateway.consume_messages(request).await {
        Ok(messages) => render(&json!({
            "topic": topic,
            "messagesReturned": messages.len(),
            "messages": messages,
        })),
        Err(e) => failure("Failed to consume messages", &e),
    }
}

// ============================================================================
// peekMessages
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeekParams {
    topic_name: String,
    partition: i64,
    offset: i64,
    #[serde(default = "default_peek_count")]
    count: i64,
}

fn default_peek_count() -> i64 {
    5
}

fn peek_messages_tool() -> RegisteredTool {
    ToolBuilder::new("peekMessages")
        .description(
            "Peek at messages from a specific partition and offset without committing. Useful \
             for inspecting messages at a known location.",
        )
        .param(
            "topicName",
            ParamKind::String,
            "The topic to peek messages from",
        )
        .param(
            "partition",
            ParamKind::Integer,
            "The partition number to read from",
        )
        .param(
            "offset",
            ParamKind::Integer,
            "The offset to start reading from",
        )
        .optional_param(
            "count",
            ParamKind::Integer,
            "Number of messages to read (default: 5)",
        )
        .category(ToolCategory::Read)
        .build(peek_messages_handler)
}

fn peek_request(params: PeekParams) -> Result<PeekRequest, KafkaOpsError> {
    let partition = to_i32("partition", params.partition)?;
    if partition < 0 {
        return Err(KafkaOpsError::BadArgument(format!(
            "partition must not be negative, got {}",
            partition
        )));
    }
    if params.offset < 0 {
        return Err(KafkaOpsError::BadArgument(format!(
            "offset must not be negative, got {}",
            params.offset
        )));
    }
    Ok(PeekRequest {
        topic: params.topic_name,
        partition,
        offset: params.offset,
        count: non_negative("count", params.count)?,
    })
}

async fn peek_messages_handler(ctx: ToolContext, params: Value) -> ToolsCallResult {
    let params: PeekParams = match parse_params(params) {
        Ok(p) => p,
        Err(e) => return failure("Failed to peek messages", &e),
    };
    let request = match peek_request(params) {
        Ok(request) => request,
        Err(e) => return failure("Failed to peek messages", &e),
    };
    let (topic, partition, offset) = (request.topic.clone(), request.partition, request.offset);

    match ctx.gateway.peek_messages(request).await {
        Ok(messages) => render(&json!({
            "topic": topic,
            "partition": partition,
            "startOffset": offset,
            "messagesReturned": messages.len(),
            "messages": messages,
        })),
        Err(e) => failure("Failed to peek messages", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kafka::{KafkaMessage, MockKafkaGateway, ProduceResult};
    use crate::mcp::tools::test_support::{context, payload};

    fn message(offset: i64, value: &str) -> KafkaMessage {
        KafkaMessage {
            topic: "orders".to_string(),
            partition: 0,
            offset,
            key: Some("k1".to_string()),
            value: Some(value.to_string()),
            timestamp: 1_700_000_000_000,
            headers: BTreeMap::new(),
        }
    }

    #[test]
    fn test_parse_headers_blank_is_empty() {
        assert!(parse_headers(None).unwrap().is_empty());
        assert!(parse_headers(Some("   ")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_headers_object() {
        let headers = parse_headers(Some(r#"{"trace": "abc", "source": "mcp"}"#)).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["trace"], "abc");
    }

    #[test]
    fn test_parse_headers_rejects_non_object() {
        assert!(matches!(
            parse_headers(Some("[1, 2]")),
            Err(KafkaOpsError::BadArgument(_))
        ));
        assert!(matches!(
            parse_headers(Some(r#"{"n": 1}"#)),
            Err(KafkaOpsError::BadArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_produce_passes_key_value_and_headers() {
        let mut gateway = MockKafkaGateway::new();
        gateway
            .expect_produce_message()
            .withf(|request| {
                request.topic == "orders"
                    && request.key.as_deref() == Some("k1")
                    && request.value.as_deref() == Some("hello")
                    && request.headers.get("trace").map(String::as_str) == Some("abc")
            })
            .returning(|request| ProduceResult::delivered(&request.topic, 0, 7, 1234));

        let result = produce_message_handler(
            context(gateway),
            json!({
                "topicName": "orders",
                "message": "hello",
                "key": "k1",
                "headersJson": "{\"trace\": \"abc\"}"
            }),
        )
        .await;

        let body = payload(&result);
        assert_eq!(body["success"], true);
        assert_eq!(body["offset"], 7);
        assert!(body.get("errorMessage").is_none());
    }

    #[tokio::test]
    async fn test_produce_broker_failure_is_a_normal_result() {
        let mut gateway = MockKafkaGateway::new();
        gateway
            .expect_produce_message()
            .returning(|request| ProduceResult::failed(&request.topic, "Message timed out"));

        let result = produce_message_handler(
            context(gateway),
            json!({"topicName": "orders", "message": "hello"}),
        )
        .await;

        assert!(!result.is_failure());
        let body = payload(&result);
        assert_eq!(body["success"], false);
        assert_eq!(body["errorMessage"], "Message timed out");
    }

    #[tokio::test]
    async fn test_produce_bad_headers_never_reach_the_gateway() {
        let gateway = MockKafkaGateway::new();
        let result = produce_message_handler(
            context(gateway),
            json!({"topicName": "orders", "message": "hello", "headersJson": "not json"}),
        )
        .await;
        assert!(result.is_failure());
    }

    #[tokio::test]
    async fn test_consume_applies_defaults() {
        let mut gateway = MockKafkaGateway::new();
        gateway
            .expect_consume_messages()
            .withf(|request| {
                request.max_messages == 10
                    && request.from_beginning
                    && request.timeout == Duration::from_secs(10)
            })
            .returning(|_| Ok(vec![message(0, "a"), message(1, "b")]));

        let result =
            consume_messages_handler(context(gateway), json!({"topicName": "orders"})).await;
        let body = payload(&result);
        assert_eq!(body["topic"], "orders");
        assert_eq!(body["messagesReturned"], 2);
        assert_eq!(body["messages"][1]["value"], "b");
    }

    #[tokio::test]
    async fn test_consume_rejects_negative_max() {
        let gateway = MockKafkaGateway::new();
        let result = consume_messages_handler(
            context(gateway),
            json!({"topicName": "orders", "maxMessages": -1}),
        )
        .await;
        let body = payload(&result);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("maxMessages must not be negative"));
    }

    #[tokio::test]
    async fn test_peek_wraps_messages_with_position() {
        let mut gateway = MockKafkaGateway::new();
        gateway
            .expect_peek_messages()
            .withf(|request| request.partition == 0 && request.offset == 5 && request.count == 5)
            .returning(|_| Ok(vec![message(5, "x")]));

        let result = peek_messages_handler(
            context(gateway),
            json!({"topicName": "orders", "partition": 0, "offset": 5}),
        )
        .await;
        let body = payload(&result);
        assert_eq!(body["partition"], 0);
        assert_eq!(body["startOffset"], 5);
        assert_eq!(body["messagesReturned"], 1);
    }

    #[tokio::test]
    async fn test_peek_out_of_range() {
        let mut gateway = MockKafkaGateway::new();
        gateway
            .expect_peek_messages()
            .returning(|_| Err(KafkaOpsError::OffsetOutOfRange("orders-0@999".into())));

        let result = peek_messages_handler(
            context(gateway),
            json!({"topicName": "orders", "partition": 0, "offset": 999}),
        )
        .await;
        let body = payload(&result);
        assert_eq!(
            body["error"],
            "Failed to peek messages: Offset out of range: orders-0@999"
        );
    }

    #[tokio::test]
    async fn test_peek_requires_partition_and_offset() {
        let gateway = MockKafkaGateway::new();
        let result =
            peek_messages_handler(context(gateway), json!({"topicName": "orders"})).await;
        assert!(result.is_failure());
    }
}
