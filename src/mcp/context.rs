//! MCP Tool Execution Context
//!
//! Provides access to server state for tool implementations.

use std::sync::Arc;
use std::time::Instant;

use crate::kafka::KafkaGateway;

/// Context provided to tool handlers during execution
#[derive(Clone)]
pub struct ToolContext {
    /// Access to the Kafka cluster
    pub gateway: Arc<dyn KafkaGateway>,

    /// Server version info
    pub server_version: String,

    /// Server start time (for uptime calculation)
    pub start_time: Instant,
}

impl ToolContext {
    pub fn new(gateway: Arc<dyn KafkaGateway>) -> Self {
        Self {
            gateway,
            server_version: server_version(),
            start_time: Instant::now(),
        }
    }
}

pub fn server_version() -> String {
    format!("{}-{}", env!("APP_VERSION"), env!("GIT_HASH"))
}
