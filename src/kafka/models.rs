//! Result model returned by the broker gateway.
//!
//! Every type here is a plain value built per request. Field names are
//! camelCase on the wire; optional keys, values, racks and coordinators are
//! serialized as `null` rather than omitted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicInfo {
    pub name: String,
    pub partition_count: usize,
    pub partitions: Vec<PartitionInfo>,
    /// Only entries the broker reports as non-default.
    pub configs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionInfo {
    pub partition: i32,
    /// Broker id, or -1 when the partition has no leader.
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub in_sync_replicas: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub value: Option<String>,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Header values without a payload are `None` (`null` on the wire).
    pub headers: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProduceResult {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub timestamp: i64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProduceResult {
    pub fn delivered(topic: &str, partition: i32, offset: i64, timestamp: i64) -> Self {
        Self {
            topic: topic.to_string(),
            partition,
            offset,
            timestamp,
            success: true,
            error_message: None,
        }
    }

    pub fn failed(topic: &str, error: impl Into<String>) -> Self {
        Self {
            topic: topic.to_string(),
            partition: -1,
            offset: -1,
            timestamp: -1,
            success: false,
            error_message: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerGroupInfo {
    pub group_id: String,
    pub state: String,
    /// "host:port" of the group coordinator when the client knows it.
    pub coordinator: Option<String>,
    pub partition_assignor: String,
    pub members: Vec<MemberInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub member_id: String,
    pub client_id: String,
    pub host: String,
    pub assignments: Vec<TopicPartitionAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPartitionAssignment {
    pub topic: String,
    pub partitions: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo {
    pub cluster_id: String,
    pub controller: BrokerInfo,
    pub brokers: Vec<BrokerInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerInfo {
    pub id: i32,
    pub host: String,
    pub port: i32,
    pub rack: Option<String>,
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ProduceRequest {
    pub topic: String,
    pub key: Option<String>,
    pub value: Option<String>,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsumeRequest {
    pub topic: String,
    pub max_messages: usize,
    pub from_beginning: bool,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeekRequest {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub count: usize,
}
