//! Client property handling shared by the admin client, the producer and the
//! ephemeral consumers.

use rdkafka::ClientConfig;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

pub const CONSUMER_GROUP_PREFIX: &str = "kafka-mcp-consumer";
pub const PEEK_GROUP_PREFIX: &str = "kafka-mcp-peek";

/// Where an ephemeral consumer starts when it has no committed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetReset {
    Earliest,
    Latest,
    /// Surface out-of-range positions as errors instead of silently resetting.
    Error,
}

impl OffsetReset {
    fn as_str(&self) -> &'static str {
        match self {
            OffsetReset::Earliest => "earliest",
            OffsetReset::Latest => "latest",
            OffsetReset::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct KafkaSettings {
    /// librdkafka properties passed through verbatim (bootstrap.servers,
    /// security.protocol, sasl.*, client.id, ...).
    pub properties: BTreeMap<String, String>,
    /// Upper bound for admin requests and metadata lookups.
    pub operation_timeout: Duration,
}

impl KafkaSettings {
    pub fn new(bootstrap_servers: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(
            "bootstrap.servers".to_string(),
            bootstrap_servers.to_string(),
        );
        Self {
            properties,
            operation_timeout: Duration::from_secs(30),
        }
    }

    pub fn bootstrap_servers(&self) -> Option<&str> {
        self.properties.get("bootstrap.servers").map(String::as_str)
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        for (key, value) in &self.properties {
            config.set(key, value);
        }
        config
    }

    pub fn producer_config(&self) -> ClientConfig {
        let mut config = self.client_config();
        config.set(
            "message.timeout.ms",
            self.operation_timeout.as_millis().to_string(),
        );
        config
    }

    /// Config for a short-lived consumer that never commits offsets.
    pub fn ephemeral_consumer_config(&self, group_id: &str, reset: OffsetReset) -> ClientConfig {
        let mut config = self.client_config();
        config
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", reset.as_str())
            .set("enable.partition.eof", "false");
        config
    }
}

pub fn ephemeral_group_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}
