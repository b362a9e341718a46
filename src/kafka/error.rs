//! Error kinds surfaced by the broker gateway.

use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use thiserror::Error;

pub type KafkaResult<T> = Result<T, KafkaOpsError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KafkaOpsError {
    #[error("Broker unavailable: {0}")]
    BrokerUnavailable(String),

    #[error("Topic '{0}' does not exist")]
    UnknownTopic(String),

    #[error("Consumer group '{0}' does not exist")]
    UnknownGroup(String),

    #[error("No controller is currently elected in the cluster")]
    NoController,

    #[error("Topic '{0}' already exists")]
    TopicExists(String),

    #[error("Invalid partition count: {0}")]
    InvalidPartitionCount(String),

    #[error("Invalid replication factor: {0}")]
    InvalidReplication(String),

    #[error("Offset out of range: {0}")]
    OffsetOutOfRange(String),

    #[error("Failed to decode record: {0}")]
    Serialization(String),

    #[error("Invalid argument: {0}")]
    BadArgument(String),

    #[error("{0}")]
    Internal(String),
}

impl KafkaOpsError {
    /// Classifies a librdkafka error code. `subject` names the topic, group or
    /// partition the failed request was about.
    pub fn from_code(code: RDKafkaErrorCode, subject: &str) -> Self {
        use RDKafkaErrorCode as C;

        match code {
            C::BrokerTransportFailure
            | C::AllBrokersDown
            | C::OperationTimedOut
            | C::RequestTimedOut
            | C::BrokerNotAvailable
            | C::NetworkException
            | C::Resolve
            | C::Authentication
            | C::SaslAuthenticationFailed => KafkaOpsError::BrokerUnavailable(code.to_string()),
            C::UnknownTopicOrPartition | C::UnknownTopic => {
                KafkaOpsError::UnknownTopic(subject.to_string())
            }
            C::TopicAlreadyExists => KafkaOpsError::TopicExists(subject.to_string()),
            C::InvalidPartitions => KafkaOpsError::InvalidPartitionCount(code.to_string()),
            C::InvalidReplicationFactor | C::InvalidReplicaAssignment => {
                KafkaOpsError::InvalidReplication(code.to_string())
            }
            C::OffsetOutOfRange | C::AutoOffsetReset => {
                KafkaOpsError::OffsetOutOfRange(format!("{} ({})", subject, code))
            }
            C::GroupIdNotFound | C::UnknownGroup => KafkaOpsError::UnknownGroup(subject.to_string()),
            C::KeyDeserialization | C::ValueDeserialization => {
                KafkaOpsError::Serialization(code.to_string())
            }
            C::NotController => KafkaOpsError::NoController,
            other => KafkaOpsError::Internal(other.to_string()),
        }
    }

    /// Classifies a client-level error, falling back to the error's own
    /// message when it carries no librdkafka code.
    pub fn from_kafka(err: KafkaError, subject: &str) -> Self {
        match err.rdkafka_error_code() {
            Some(code) => Self::from_code(code, subject),
            None => KafkaOpsError::Internal(err.to_string()),
        }
    }

    pub fn is_broker_unavailable(&self) -> bool {
        matches!(self, KafkaOpsError::BrokerUnavailable(_))
    }

    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            KafkaOpsError::BrokerUnavailable(_) => "broker_unavailable",
            KafkaOpsError::UnknownTopic(_) => "unknown_topic",
            KafkaOpsError::UnknownGroup(_) => "unknown_group",
            KafkaOpsError::NoController => "no_controller",
            KafkaOpsError::TopicExists(_) => "topic_exists",
            KafkaOpsError::InvalidPartitionCount(_) => "invalid_partition_count",
            KafkaOpsError::InvalidReplication(_) => "invalid_replication",
            KafkaOpsError::OffsetOutOfRange(_) => "offset_out_of_range",
            KafkaOpsError::Serialization(_) => "serialization",
            KafkaOpsError::BadArgument(_) => "bad_argument",
            KafkaOpsError::Internal(_) => "internal",
        }
    }
}
