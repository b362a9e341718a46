//! Short-lived consumers for bounded reads.
//!
//! Every read opens its own consumer under a fresh group id, never commits,
//! and drops the consumer (closing it) when the read returns. The read loops
//! are written against [`RecordSource`] so their limits can be tested without
//! a broker.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::message::{Headers, Message};
use rdkafka::{Offset, TopicPartitionList};
use tracing::{debug, warn};

use super::client_config::{
    ephemeral_group_id, KafkaSettings, OffsetReset, CONSUMER_GROUP_PREFIX, PEEK_GROUP_PREFIX,
};
use super::error::{KafkaOpsError, KafkaResult};
use super::metadata::find_topic;
use super::models::KafkaMessage;

/// Longest single poll while consuming.
pub const CONSUME_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A peek stops at the first poll that yields nothing within this window.
pub const PEEK_POLL_TIMEOUT: Duration = Duration::from_secs(5);

pub trait RecordSource {
    /// Waits up to `timeout` for the next record. `None` means nothing arrived.
    fn poll(&mut self, timeout: Duration) -> Option<KafkaResult<KafkaMessage>>;
}

/// Collects records until `max_messages` are read or `timeout` elapses,
/// whichever comes first. Client errors after the read started are logged and
/// never fail the call; an undecodable record ends the read early.
pub fn drain_bounded<S: RecordSource>(
    source: &mut S,
    max_messages: usize,
    timeout: Duration,
) -> Vec<KafkaMessage> {
    // A timeout past the clock's range means no deadline at all.
    let deadline = Instant::now().checked_add(timeout);
    let mut messages = Vec::new();

    while messages.len() < max_messages {
        let step = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                (deadline - now).min(CONSUME_POLL_INTERVAL)
            }
            None => CONSUME_POLL_INTERVAL,
        };

        match source.poll(step) {
            None => {}
            Some(Ok(message)) => messages.push(message),
            Some(Err(err @ KafkaOpsError::Serialization(_))) => {
                warn!(
                    "Stopping consume after {} message(s): {}",
                    messages.len(),
                    err
                );
                break;
            }
            Some(Err(err)) => {
                warn!("Consumer reported an error, continuing: {}", err);
            }
        }
    }

    messages
}

/// Reads up to `count` records, stopping at the first empty poll.
pub fn read_window<S: RecordSource>(
    source: &mut S,
    count: usize,
    poll_timeout: Duration,
) -> KafkaResult<Vec<KafkaMessage>> {
    let mut messages = Vec::with_capacity(count.min(64));

    while messages.len() < count {
        match source.poll(poll_timeout) {
            None => break,
            Some(result) => messages.push(result?),
        }
    }

    Ok(messages)
}

/// Converts a received record, decoding key, value and headers as UTF-8.
pub fn decode_message<M: Message>(message: &M) -> KafkaResult<KafkaMessage> {
    let key = message
        .key_view::<str>()
        .transpose()
        .map_err(|e| KafkaOpsError::Serialization(format!("key: {}", e)))?
        .map(str::to_string);
    let value = message
        .payload_view::<str>()
        .transpose()
        .map_err(|e| KafkaOpsError::Serialization(format!("value: {}", e)))?
        .map(str::to_string);

    let mut headers = BTreeMap::new();
    if let Some(raw) = message.headers() {
        for header in raw.iter() {
            let value = header
                .value
                .map(std::str::from_utf8)
                .transpose()
                .map_err(|e| {
                    KafkaOpsError::Serialization(format!("header '{}': {}", header.key, e))
                })?
                .map(str::to_string);
            headers.insert(header.key.to_string(), value);
        }
    }

    Ok(KafkaMessage {
        topic: message.topic().to_string(),
        partition: message.partition(),
        offset: message.offset(),
        key,
        value,
        timestamp: message.timestamp().to_millis().unwrap_or(-1),
        headers,
    })
}

// ============================================================================
// librdkafka-backed source
// ============================================================================

pub struct ConsumerSource {
    consumer: BaseConsumer,
    subject: String,
    group_id: String,
}

impl RecordSource for ConsumerSource {
    fn poll(&mut self, timeout: Duration) -> Option<KafkaResult<KafkaMessage>> {
        let subject = &self.subject;
        self.consumer.poll(timeout).map(|result| {
            result
                .map_err(|e| KafkaOpsError::from_kafka(e, subject))
                .and_then(|message| decode_message(&message))
        })
    }
}

impl Drop for ConsumerSource {
    fn drop(&mut self) {
        debug!("Closing ephemeral consumer {}", self.group_id);
    }
}

/// Opens a consumer subscribed to `topic`. Fails with `UnknownTopic` before
/// subscribing when the broker does not know the topic.
pub fn open_subscribed(
    settings: &KafkaSettings,
    topic: &str,
    from_beginning: bool,
) -> KafkaResult<ConsumerSource> {
    let reset = if from_beginning {
        OffsetReset::Earliest
    } else {
        OffsetReset::Latest
    };
    let group_id = ephemeral_group_id(CONSUMER_GROUP_PREFIX);
    let consumer: BaseConsumer = settings
        .ephemeral_consumer_config(&group_id, reset)
        .create()
        .map_err(|e| KafkaOpsError::from_kafka(e, topic))?;

    let metadata = consumer
        .fetch_metadata(Some(topic), settings.operation_timeout)
        .map_err(|e| KafkaOpsError::from_kafka(e, topic))?;
    find_topic(&metadata, topic)?;

    consumer
        .subscribe(&[topic])
        .map_err(|e| KafkaOpsError::from_kafka(e, topic))?;
    debug!("Consumer {} subscribed to {}", group_id, topic);

    Ok(ConsumerSource {
        consumer,
        subject: topic.to_string(),
        group_id,
    })
}

/// Opens a consumer assigned to a single partition, positioned at `offset`.
pub fn open_assigned(
    settings: &KafkaSettings,
    topic: &str,
    partition: i32,
    offset: i64,
) -> KafkaResult<ConsumerSource> {
    let group_id = ephemeral_group_id(PEEK_GROUP_PREFIX);
    let consumer: BaseConsumer = settings
        .ephemeral_consumer_config(&group_id, OffsetReset::Error)
        .create()
        .map_err(|e| KafkaOpsError::from_kafka(e, topic))?;

    let metadata = consumer
        .fetch_metadata(Some(topic), settings.operation_timeout)
        .map_err(|e| KafkaOpsError::from_kafka(e, topic))?;
    let entry = find_topic(&metadata, topic)?;
    if !entry.partitions().iter().any(|p| p.id() == partition) {
        return Err(KafkaOpsError::BadArgument(format!(
            "partition {} does not exist for topic '{}' ({} partition(s))",
            partition,
            topic,
            entry.partitions().len()
        )));
    }

    let subject = format!("{}-{}@{}", topic, partition, offset);
    let mut assignment = TopicPartitionList::new();
    assignment
        .add_partition_offset(topic, partition, Offset::Offset(offset))
        .map_err(|e| KafkaOpsError::from_kafka(e, &subject))?;
    consumer
        .assign(&assignment)
        .map_err(|e| KafkaOpsError::from_kafka(e, &subject))?;
    debug!("Consumer {} assigned to {}", group_id, subject);

    Ok(ConsumerSource {
        consumer,
        subject,
        group_id,
    })
}
