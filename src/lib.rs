//! Kafka MCP Server Library
//!
//! Exposes Kafka cluster administration and data-plane operations as MCP
//! tools. The modules are public for the end-to-end tests and for embedding
//! the server with a different broker gateway.

pub mod config;
pub mod kafka;
pub mod mcp;
pub mod server;

// Re-export commonly used types for convenience
pub use kafka::{KafkaGateway, KafkaOpsError, RdKafkaGateway};
pub use server::{run_server, RequestsLoggingLevel};
