use rdkafka::metadata::{Metadata, MetadataBroker, MetadataPartition, MetadataTopic};

use super::error::{KafkaOpsError, KafkaResult};
use super::models::{BrokerInfo, PartitionInfo};

/// Finds `topic` in a metadata response, turning a per-topic error into the
/// matching gateway error.
pub fn find_topic<'a>(metadata: &'a Metadata, topic: &str) -> KafkaResult<&'a MetadataTopic> {
    let entry = metadata
        .topics()
        .iter()
        .find(|t| t.name() == topic)
        .ok_or_else(|| KafkaOpsError::UnknownTopic(topic.to_string()))?;

    match entry.error() {
        Some(err) => Err(KafkaOpsError::from_code(err.into(), topic)),
        None => Ok(entry),
    }
}

pub fn partition_info(partition: &MetadataPartition) -> PartitionInfo {
    PartitionInfo {
        partition: partition.id(),
        leader: partition.leader(),
        replicas: partition.replicas().to_vec(),
        in_sync_replicas: partition.isr().to_vec(),
    }
}

pub fn broker_info(broker: &MetadataBroker) -> BrokerInfo {
    BrokerInfo {
        id: broker.id(),
        host: broker.host().to_string(),
        port: broker.port(),
        // librdkafka does not expose broker racks through metadata.
        rack: None,
    }
}
