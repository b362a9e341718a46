use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rdkafka::admin::{AdminOptions, ConfigEntry, NewTopic, ResourceSpecifier, TopicReplication};
use rdkafka::client::{Client, DefaultClientContext};
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use tracing::{debug, info, warn};

use super::admin::AdminHandle;
use super::assignment::decode_member_assignment;
use super::client_config::KafkaSettings;
use super::consumer::{self, PEEK_POLL_TIMEOUT};
use super::error::{KafkaOpsError, KafkaResult};
use super::metadata::{broker_info, find_topic, partition_info};
use super::models::*;

/// Operations the MCP tools perform against a Kafka cluster.
///
/// Every call is self-contained: no state survives between calls apart from
/// the shared clients the implementation owns.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait KafkaGateway: Send + Sync {
    /// Topic names in broker metadata order.
    async fn list_topics(&self) -> KafkaResult<Vec<String>>;

    async fn describe_topic(&self, name: &str) -> KafkaResult<TopicInfo>;

    /// Returns a confirmation message echoing the created topic's settings.
    async fn create_topic(
        &self,
        name: &str,
        partitions: i32,
        replication_factor: i32,
    ) -> KafkaResult<String>;

    async fn delete_topic(&self, name: &str) -> KafkaResult<String>;

    /// Broker-side failures are reported in the result, never as an error.
    ///
    /// The reported timestamp is the producer's wall clock at send time, which
    /// is also the record's CreateTime. Topics configured with LogAppendTime
    /// store the broker's append time instead, so a later read may differ.
    async fn produce_message(&self, request: ProduceRequest) -> ProduceResult;

    async fn consume_messages(&self, request: ConsumeRequest) -> KafkaResult<Vec<KafkaMessage>>;

    async fn peek_messages(&self, request: PeekRequest) -> KafkaResult<Vec<KafkaMessage>>;

    async fn list_consumer_groups(&self) -> KafkaResult<Vec<String>>;

    async fn describe_consumer_group(&self, group_id: &str) -> KafkaResult<ConsumerGroupInfo>;

    async fn describe_cluster(&self) -> KafkaResult<ClusterInfo>;
}

pub fn created_message(name: &str, partitions: i32, replication_factor: i32) -> String {
    format!(
        "Topic '{}' created successfully with {} partition(s) and replication factor {}",
        name, partitions, replication_factor
    )
}

pub fn deleted_message(name: &str) -> String {
    format!("Topic '{}' deleted successfully", name)
}

async fn run_blocking<T, F>(f: F) -> KafkaResult<T>
where
    F: FnOnce() -> KafkaResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| KafkaOpsError::Internal(format!("blocking task failed: {}", e)))?
}

/// Id of the current controller, or -1 when none is elected.
fn controller_id(client: &Client<DefaultClientContext>, timeout: Duration) -> i32 {
    let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
    // SAFETY: the pointer comes from a live client borrowed for the whole call.
    unsafe { rdkafka_sys::rd_kafka_controllerid(client.native_client().ptr(), timeout_ms) }
}

/// Explicitly set topic configs. Sensitive entries come back without a value
/// and are left out.
pub(crate) fn non_default_configs(entries: Vec<ConfigEntry>) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .filter(|entry| !entry.is_default)
        .filter_map(|entry| entry.value.map(|value| (entry.name, value)))
        .collect()
}

/// Brokers answer lookups for unknown ids with an empty `Dead` group.
fn ensure_group_exists(group_id: &str, state: &str, member_count: usize) -> KafkaResult<()> {
    if state == "Dead" && member_count == 0 {
        return Err(KafkaOpsError::UnknownGroup(group_id.to_string()));
    }
    Ok(())
}

/// Only the `consumer` protocol defines the assignment layout; anything else
/// is reported without assignments.
fn member_assignments(
    member_id: &str,
    assignment: Option<&[u8]>,
    uses_consumer_protocol: bool,
) -> Vec<TopicPartitionAssignment> {
    match assignment {
        Some(bytes) if uses_consumer_protocol => {
            decode_member_assignment(bytes).unwrap_or_else(|e| {
                warn!("Undecodable assignment for member {}: {}", member_id, e);
                Vec::new()
            })
        }
        _ => Vec::new(),
    }
}

/// A negative id that came back only once the wait expired means the cluster
/// never answered, not that no controller is elected.
fn resolve_controller(
    controller_id: i32,
    brokers: &[BrokerInfo],
    timed_out: bool,
) -> KafkaResult<BrokerInfo> {
    if controller_id < 0 {
        if timed_out {
            return Err(KafkaOpsError::BrokerUnavailable(
                "timed out waiting for the controller id".to_string(),
            ));
        }
        return Err(KafkaOpsError::NoController);
    }
    brokers
        .iter()
        .find(|b| b.id == controller_id)
        .cloned()
        .ok_or(KafkaOpsError::NoController)
}

pub struct RdKafkaGateway {
    settings: KafkaSettings,
    admin: AdminHandle,
    producer: FutureProducer,
}

impl RdKafkaGateway {
    pub fn new(settings: KafkaSettings) -> KafkaResult<Self> {
        let admin = AdminHandle::new(settings.clone())?;
        let producer: FutureProducer = settings
            .producer_config()
            .create()
            .map_err(|e| KafkaOpsError::from_kafka(e, "producer"))?;

        info!(
            "Kafka clients created for {}",
            settings.bootstrap_servers().unwrap_or("<unset>")
        );

        Ok(Self {
            settings,
            admin,
            producer,
        })
    }

    fn admin_options(&self) -> AdminOptions {
        AdminOptions::new()
            .operation_timeout(Some(self.settings.operation_timeout))
            .request_timeout(Some(self.settings.operation_timeout))
    }

    async fn fetch_topic_partitions(&self, name: &str) -> KafkaResult<Vec<PartitionInfo>> {
        let admin = self.admin.client()?;
        let timeout = self.settings.operation_timeout;
        let topic = name.to_string();

        run_blocking(move || {
            let metadata = admin
                .inner()
                .fetch_metadata(Some(topic.as_str()), timeout)
                .map_err(|e| KafkaOpsError::from_kafka(e, &topic))?;
            let entry = find_topic(&metadata, &topic)?;
            Ok(entry.partitions().iter().map(partition_info).collect())
        })
        .await
    }

    async fn fetch_topic_configs(&self, name: &str) -> KafkaResult<BTreeMap<String, String>> {
        let admin = self.admin.client()?;
        let results = admin
            .describe_configs(&[ResourceSpecifier::Topic(name)], &self.admin_options())
            .await
            .map_err(|e| KafkaOpsError::from_kafka(e, name))?;

        let mut configs = BTreeMap::new();
        for result in results {
            let resource = result.map_err(|code| KafkaOpsError::from_code(code, name))?;
            configs.extend(non_default_configs(resource.entries));
        }
        Ok(configs)
    }
}

#[async_trait]
impl KafkaGateway for RdKafkaGateway {
    async fn list_topics(&self) -> KafkaResult<Vec<String>> {
        let admin = self.admin.client()?;
        let timeout = self.settings.operation_timeout;

        let outcome = run_blocking(move || {
            let metadata = admin
                .inner()
                .fetch_metadata(None, timeout)
                .map_err(|e| KafkaOpsError::from_kafka(e, "cluster"))?;
            Ok(metadata
                .topics()
                .iter()
                .map(|t| t.name().to_string())
                .collect())
        })
        .await;

        self.admin.observe(outcome)
    }

    async fn describe_topic(&self, name: &str) -> KafkaResult<TopicInfo> {
        debug!("Describing topic {}", name);
        let outcome = async {
            let partitions = self.fetch_topic_partitions(name).await?;
            let configs = self.fetch_topic_configs(name).await?;
            Ok::<_, KafkaOpsError>(TopicInfo {
                name: name.to_string(),
                partition_count: partitions.len(),
                partitions,
                configs,
            })
        }
        .await;

        self.admin.observe(outcome)
    }

    async fn create_topic(
        &self,
        name: &str,
        partitions: i32,
        replication_factor: i32,
    ) -> KafkaResult<String> {
        if partitions < 1 {
            return Err(KafkaOpsError::InvalidPartitionCount(format!(
                "partitions must be at least 1, got {}",
                partitions
            )));
        }
        if replication_factor < 1 {
            return Err(KafkaOpsError::InvalidReplication(format!(
                "replication factor must be at least 1, got {}",
                replication_factor
            )));
        }

        let outcome = async {
            let admin = self.admin.client()?;
            let new_topic = NewTopic::new(
                name,
                partitions,
                TopicReplication::Fixed(replication_factor),
            );
            let results = admin
                .create_topics(&[new_topic], &self.admin_options())
                .await
                .map_err(|e| KafkaOpsError::from_kafka(e, name))?;
            for result in results {
                if let Err((topic, code)) = result {
                    return Err(KafkaOpsError::from_code(code, &topic));
                }
            }
            Ok::<_, KafkaOpsError>(())
        }
        .await;
        self.admin.observe(outcome)?;

        info!(
            "Created topic {} ({} partitions, rf {})",
            name, partitions, replication_factor
        );
        Ok(created_message(name, partitions, replication_factor))
    }

    async fn delete_topic(&self, name: &str) -> KafkaResult<String> {
        let outcome = async {
            let admin = self.admin.client()?;
            let results = admin
                .delete_topics(&[name], &self.admin_options())
                .await
                .map_err(|e| KafkaOpsError::from_kafka(e, name))?;
            for result in results {
                if let Err((topic, code)) = result {
                    return Err(KafkaOpsError::from_code(code, &topic));
                }
            }
            Ok::<_, KafkaOpsError>(())
        }
        .await;
        self.admin.observe(outcome)?;

        info!("Deleted topic {}", name);
        Ok(deleted_message(name))
    }

    async fn produce_message(&self, request: ProduceRequest) -> ProduceResult {
        let timestamp = chrono::Utc::now().timestamp_millis();

        let mut headers = OwnedHeaders::new_with_capacity(request.headers.len());
        for (key, value) in &request.headers {
            headers = headers.insert(Header {
                key: key.as_str(),
                value: Some(value.as_str()),
            });
        }

        let mut record = FutureRecord::<str, str>::to(&request.topic)
            .timestamp(timestamp)
            .headers(headers);
        if let Some(key) = request.key.as_deref() {
            record = record.key(key);
        }
        if let Some(value) = request.value.as_deref() {
            record = record.payload(value);
        }

        match self
            .producer
            .send(record, self.settings.operation_timeout)
            .await
        {
            Ok((partition, offset)) => {
                debug!(
                    "Produced to {}-{} at offset {}",
                    request.topic, partition, offset
                );
                ProduceResult::delivered(&request.topic, partition, offset, timestamp)
            }
            Err((err, _)) => {
                warn!("Failed to produce to {}: {}", request.topic, err);
                ProduceResult::failed(&request.topic, err.to_string())
            }
        }
    }

    async fn consume_messages(&self, request: ConsumeRequest) -> KafkaResult<Vec<KafkaMessage>> {
        let settings = self.settings.clone();

        let messages = run_blocking(move || {
            let mut source =
                consumer::open_subscribed(&settings, &request.topic, request.from_beginning)?;
            Ok(consumer::drain_bounded(
                &mut source,
                request.max_messages,
                request.timeout,
            ))
        })
        .await?;

        debug!("Consumed {} message(s)", messages.len());
        Ok(messages)
    }

    async fn peek_messages(&self, request: PeekRequest) -> KafkaResult<Vec<KafkaMessage>> {
        let settings = self.settings.clone();

        run_blocking(move || {
            let mut source = consumer::open_assigned(
                &settings,
                &request.topic,
                request.partition,
                request.offset,
            )?;
            consumer::read_window(&mut source, request.count, PEEK_POLL_TIMEOUT)
        })
        .await
    }

    async fn list_consumer_groups(&self) -> KafkaResult<Vec<String>> {
        let admin = self.admin.client()?;
        let timeout = self.settings.operation_timeout;

        let outcome = run_blocking(move || {
            let groups = admin
                .inner()
                .fetch_group_list(None, timeout)
                .map_err(|e| KafkaOpsError::from_kafka(e, "consumer groups"))?;
            Ok(groups
                .groups()
                .iter()
                .map(|g| g.name().to_string())
                .collect())
        })
        .await;

        self.admin.observe(outcome)
    }

    async fn describe_consumer_group(&self, group_id: &str) -> KafkaResult<ConsumerGroupInfo> {
        let admin = self.admin.client()?;
        let timeout = self.settings.operation_timeout;
        let group_id = group_id.to_string();

        let outcome = run_blocking(move || {
            let list = admin
                .inner()
                .fetch_group_list(Some(group_id.as_str()), timeout)
                .map_err(|e| KafkaOpsError::from_kafka(e, &group_id))?;
            let group = list
                .groups()
                .iter()
                .find(|g| g.name() == group_id)
                .ok_or_else(|| KafkaOpsError::UnknownGroup(group_id.clone()))?;

            ensure_group_exists(&group_id, group.state(), group.members().len())?;

            let uses_consumer_protocol = group.protocol_type() == "consumer";
            let members = group
                .members()
                .iter()
                .map(|member| MemberInfo {
                    member_id: member.id().to_string(),
                    client_id: member.client_id().to_string(),
                    host: member.client_host().to_string(),
                    assignments: member_assignments(
                        member.id(),
                        member.assignment(),
                        uses_consumer_protocol,
                    ),
                })
                .collect();

            Ok(ConsumerGroupInfo {
                group_id: group_id.clone(),
                state: group.state().to_string(),
                // The group list response does not carry the coordinator.
                coordinator: None,
                partition_assignor: group.protocol().to_string(),
                members,
            })
        })
        .await;

        self.admin.observe(outcome)
    }

    async fn describe_cluster(&self) -> KafkaResult<ClusterInfo> {
        let admin = self.admin.client()?;
        let timeout = self.settings.operation_timeout;

        let outcome = run_blocking(move || {
            let client = admin.inner();
            let metadata = client
                .fetch_metadata(None, timeout)
                .map_err(|e| KafkaOpsError::from_kafka(e, "cluster"))?;
            let brokers: Vec<BrokerInfo> = metadata.brokers().iter().map(broker_info).collect();
            let cluster_id = client.fetch_cluster_id(timeout).unwrap_or_default();

            let started = Instant::now();
            let controller_id = controller_id(client, timeout);
            let controller =
                resolve_controller(controller_id, &brokers, started.elapsed() >= timeout)?;

            Ok(ClusterInfo {
                cluster_id,
                controller,
                brokers,
            })
        })
        .await;

        self.admin.observe(outcome)
    }
}
