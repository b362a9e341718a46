//! Decoder for consumer-protocol member assignments.
//!
//! Group members using the standard consumer protocol report their
//! assignment as an opaque byte blob:
//!
//! ```text
//! version:     i16
//! topics:      i32 count, then per topic
//!   name:      i16 length + UTF-8 bytes
//!   partitions: i32 count, then i32 each
//! user_data:   i32 length + bytes (-1 for null)
//! ```

use super::error::{KafkaOpsError, KafkaResult};
use super::models::TopicPartitionAssignment;

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> KafkaResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                KafkaOpsError::Serialization(format!(
                    "assignment truncated at byte {} (needed {} more)",
                    self.pos, n
                ))
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn i16(&mut self) -> KafkaResult<i16> {
        let b = self.take(2)?;
        Ok(i16::from_be_bytes([b[0], b[1]]))
    }

    fn i32(&mut self) -> KafkaResult<i32> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Array length. Each element takes at least `min_element_len` bytes, so
    /// a count the remaining input cannot hold is rejected up front.
    fn count(&mut self, min_element_len: usize) -> KafkaResult<usize> {
        let n = self.i32()?;
        // Null arrays are encoded as -1.
        let n = n.max(0) as usize;
        let remaining = self.buf.len() - self.pos;
        if n > remaining / min_element_len {
            return Err(KafkaOpsError::Serialization(format!(
                "assignment declares {} entries but only {} bytes remain",
                n, remaining
            )));
        }
        Ok(n)
    }

    fn string(&mut self) -> KafkaResult<String> {
        let len = self.i16()?;
        if len < 0 {
            return Err(KafkaOpsError::Serialization(
                "null topic name in assignment".to_string(),
            ));
        }
        let bytes = self.take(len as usize)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| KafkaOpsError::Serialization(format!("topic name: {}", e)))
    }
}

/// Decodes a member's assignment, grouping partitions by topic in the order
/// topics first appear. Empty input means the member has no assignment yet.
pub fn decode_member_assignment(bytes: &[u8]) -> KafkaResult<Vec<TopicPartitionAssignment>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = Reader::new(bytes);
    let _version = reader.i16()?;

    let mut assignments: Vec<TopicPartitionAssignment> = Vec::new();
    // A topic entry is at least a name length and a partition count.
    for _ in 0..reader.count(6)? {
        let topic = reader.string()?;
        let partition_count = reader.count(4)?;
        let mut partitions = Vec::with_capacity(partition_count);
        for _ in 0..partition_count {
            partitions.push(reader.i32()?);
        }

        match assignments.iter_mut().find(|a| a.topic == topic) {
            Some(existing) => existing.partitions.extend(partitions),
            None => assignments.push(TopicPartitionAssignment { topic, partitions }),
        }
    }

    // Trailing user data is not surfaced.
    Ok(assignments)
}
