//! In-memory broker used by the end-to-end tests
//!
//! Implements `KafkaGateway` over plain collections so the whole HTTP/SSE
//! path can be exercised without a running cluster. It mirrors the broker
//! behaviours the tools depend on: validation errors on create, unknown
//! topics and groups, out-of-range offsets and consume deadlines.

use super::constants::*;
use async_trait::async_trait;
use kafka_mcp_server::kafka::gateway::{created_message, deleted_message};
use kafka_mcp_server::kafka::{
    BrokerInfo, ClusterInfo, ConsumeRequest, ConsumerGroupInfo, KafkaGateway, KafkaMessage,
    KafkaOpsError, KafkaResult, MemberInfo, PartitionInfo, PeekRequest, ProduceRequest,
    ProduceResult, TopicInfo, TopicPartitionAssignment,
};
use std::collections::BTreeMap;
use std::sync::Mutex;

struct TopicState {
    partitions: Vec<Vec<KafkaMessage>>,
    replication_factor: i32,
    configs: BTreeMap<String, String>,
}

impl TopicState {
    fn new(partitions: i32, replication_factor: i32) -> Self {
        Self {
            partitions: (0..partitions).map(|_| Vec::new()).collect(),
            replication_factor,
            configs: BTreeMap::new(),
        }
    }
}

struct ClusterState {
    topics: BTreeMap<String, TopicState>,
    groups: BTreeMap<String, ConsumerGroupInfo>,
    controller: Option<i32>,
}

pub struct InMemoryGateway {
    state: Mutex<ClusterState>,
}

fn broker(id: i32) -> BrokerInfo {
    BrokerInfo {
        id,
        host: format!("kafka-{}.test", id),
        port: 9092,
        rack: None,
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl InMemoryGateway {
    /// Empty cluster with an elected controller
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(ClusterState {
                topics: BTreeMap::new(),
                groups: BTreeMap::new(),
                controller: Some(CONTROLLER_ID),
            }),
        }
    }

    /// Cluster with ORDERS_TOPIC, AUDIT_TOPIC and BILLING_GROUP
    pub fn seeded() -> Self {
        let gateway = Self::empty();
        {
            let mut state = gateway.state.lock().unwrap();

            let mut orders = TopicState::new(ORDERS_PARTITIONS, 2);
            orders
                .configs
                .insert("retention.ms".to_string(), "604800000".to_string());
            for offset in 0..ORDERS_SEEDED_MESSAGES {
                let mut headers = BTreeMap::new();
                headers.insert("source".to_string(), Some("seed".to_string()));
                orders.partitions[0].push(KafkaMessage {
                    topic: ORDERS_TOPIC.to_string(),
                    partition: 0,
                    offset: offset as i64,
                    key: Some(format!("order-{}", offset)),
                    value: Some(format!("{{\"orderId\": {}}}", offset)),
                    timestamp: 1_700_000_000_000 + offset as i64,
                    headers,
                });
            }
            state.topics.insert(ORDERS_TOPIC.to_string(), orders);
            state
                .topics
                .insert(AUDIT_TOPIC.to_string(), TopicState::new(1, 1));

            state.groups.insert(
                BILLING_GROUP.to_string(),
                ConsumerGroupInfo {
                    group_id: BILLING_GROUP.to_string(),
                    state: "Stable".to_string(),
                    coordinator: None,
                    partition_assignor: "range".to_string(),
                    members: vec![MemberInfo {
                        member_id: "billing-1-7f3a".to_string(),
                        client_id: "billing-1".to_string(),
                        host: "/10.0.0.12".to_string(),
                        assignments: vec![TopicPartitionAssignment {
                            topic: ORDERS_TOPIC.to_string(),
                            partitions: (0..ORDERS_PARTITIONS).collect(),
                        }],
                    }],
                },
            );
        }
        gateway
    }

    /// Simulates a cluster in the middle of a controller election
    pub fn without_controller(self) -> Self {
        self.state.lock().unwrap().controller = None;
        self
    }

    /// Number of records currently stored in a topic
    pub fn record_count(&self, topic: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .topics
            .get(topic)
            .map(|t| t.partitions.iter().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.state.lock().unwrap().topics.contains_key(topic)
    }
}

#[async_trait]
impl KafkaGateway for InMemoryGateway {
    async fn list_topics(&self) -> KafkaResult<Vec<String>> {
        Ok(self.state.lock().unwrap().topics.keys().cloned().collect())
    }

    async fn describe_topic(&self, name: &str) -> KafkaResult<TopicInfo> {
        let state = self.state.lock().unwrap();
        let topic = state
            .topics
            .get(name)
            .ok_or_else(|| KafkaOpsError::UnknownTopic(name.to_string()))?;

        let replicas: Vec<i32> = (1..=topic.replication_factor).collect();
        let partitions = (0..topic.partitions.len() as i32)
            .map(|partition| PartitionInfo {
                partition,
                leader: replicas[partition as usize % replicas.len()],
                replicas: replicas.clone(),
                in_sync_replicas: replicas.clone(),
            })
            .collect::<Vec<_>>();

        Ok(TopicInfo {
            name: name.to_string(),
            partition_count: partitions.len(),
            partitions,
            configs: topic.configs.clone(),
        })
    }

    async fn create_topic(
        &self,
        name: &str,
        partitions: i32,
        replication_factor: i32,
    ) -> KafkaResult<String> {
        if partitions < 1 {
            return Err(KafkaOpsError::InvalidPartitionCount(format!(
                "Number of partitions must be larger than 0, got {}",
                partitions
            )));
        }
        if replication_factor < 1 || replication_factor > BROKER_COUNT {
            return Err(KafkaOpsError::InvalidReplication(format!(
                "Replication factor: {} larger than available brokers: {}",
                replication_factor, BROKER_COUNT
            )));
        }

        let mut state = self.state.lock().unwrap();
        if state.topics.contains_key(name) {
            return Err(KafkaOpsError::TopicExists(name.to_string()));
        }
        state.topics.insert(
            name.to_string(),
            TopicState::new(partitions, replication_factor),
        );
        Ok(created_message(name, partitions, replication_factor))
    }

    async fn delete_topic(&self, name: &str) -> KafkaResult<String> {
        let mut state = self.state.lock().unwrap();
        state
            .topics
            .remove(name)
            .ok_or_else(|| KafkaOpsError::UnknownTopic(name.to_string()))?;
        Ok(deleted_message(name))
    }

    async fn produce_message(&self, request: ProduceRequest) -> ProduceResult {
        let mut state = self.state.lock().unwrap();
        let Some(topic) = state.topics.get_mut(&request.topic) else {
            return ProduceResult::failed(
                &request.topic,
                "Broker: Unknown topic or partition",
            );
        };

        let partition = match &request.key {
            Some(key) => key.bytes().map(usize::from).sum::<usize>() % topic.partitions.len(),
            None => 0,
        };
        let log = &mut topic.partitions[partition];
        let offset = log.len() as i64;
        let timestamp = now_millis();
        log.push(KafkaMessage {
            topic: request.topic.clone(),
            partition: partition as i32,
            offset,
            key: request.key,
            value: request.value,
            timestamp,
            headers: request
                .headers
                .into_iter()
                .map(|(name, value)| (name, Some(value)))
                .collect(),
        });

        ProduceResult::delivered(&request.topic, partition as i32, offset, timestamp)
    }

    async fn consume_messages(&self, request: ConsumeRequest) -> KafkaResult<Vec<KafkaMessage>> {
        if request.max_messages == 0 {
            return Ok(Vec::new());
        }

        let messages: Vec<KafkaMessage> = {
            let state = self.state.lock().unwrap();
            let topic = state
                .topics
                .get(&request.topic)
                .ok_or_else(|| KafkaOpsError::UnknownTopic(request.topic.clone()))?;
            if request.from_beginning {
                topic
                    .partitions
                    .iter()
                    .flatten()
                    .take(request.max_messages)
                    .cloned()
                    .collect()
            } else {
                Vec::new()
            }
        };

        // A real consumer keeps polling until the deadline when short of records.
        if messages.len() < request.max_messages {
            tokio::time::sleep(request.timeout).await;
        }
        Ok(messages)
    }

    async fn peek_messages(&self, request: PeekRequest) -> KafkaResult<Vec<KafkaMessage>> {
        let state = self.state.lock().unwrap();
        let topic = state
            .topics
            .get(&request.topic)
            .ok_or_else(|| KafkaOpsError::UnknownTopic(request.topic.clone()))?;
        let log = topic
            .partitions
            .get(request.partition as usize)
            .ok_or_else(|| {
                KafkaOpsError::BadArgument(format!(
                    "Partition {} does not exist for topic '{}'",
                    request.partition, request.topic
                ))
            })?;

        let start = request.offset as usize;
        if start > log.len() {
            return Err(KafkaOpsError::OffsetOutOfRange(format!(
                "{} [{}] offset {}",
                request.topic, request.partition, request.offset
            )));
        }
        let end = (start + request.count).min(log.len());
        Ok(log[start..end].to_vec())
    }

    async fn list_consumer_groups(&self) -> KafkaResult<Vec<String>> {
        Ok(self.state.lock().unwrap().groups.keys().cloned().collect())
    }

    async fn describe_consumer_group(&self, group_id: &str) -> KafkaResult<ConsumerGroupInfo> {
        self.state
            .lock()
            .unwrap()
            .groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| KafkaOpsError::UnknownGroup(group_id.to_string()))
    }

    async fn describe_cluster(&self) -> KafkaResult<ClusterInfo> {
        let controller_id = self
            .state
            .lock()
            .unwrap()
            .controller
            .ok_or(KafkaOpsError::NoController)?;

        Ok(ClusterInfo {
            cluster_id: CLUSTER_ID.to_string(),
            controller: broker(controller_id),
            brokers: (1..=BROKER_COUNT).map(broker).collect(),
        })
    }
}
