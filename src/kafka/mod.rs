//! Broker gateway
//!
//! A stateless facade over librdkafka: a shared admin client (rebuilt after
//! repeated transport failures), a shared producer, and short-lived consumers
//! created per read. Everything above this module talks to the cluster
//! through the [`KafkaGateway`] trait.

pub mod admin;
pub mod assignment;
pub mod client_config;
pub mod consumer;
pub mod error;
pub mod gateway;
pub mod metadata;
pub mod models;

pub use client_config::KafkaSettings;
pub use error::{KafkaOpsError, KafkaResult};
#[cfg(any(test, feature = "mock"))]
pub use gateway::MockKafkaGateway;
pub use gateway::{KafkaGateway, RdKafkaGateway};
pub use models::*;
