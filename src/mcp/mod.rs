//! MCP (Model Context Protocol) Server
//!
//! Exposes the Kafka gateway to LLM hosts as a set of tools.
//!
//! ## Architecture
//!
//! - Transport: SSE stream at `/mcp/sse`, client messages POSTed to
//!   `/mcp/message?sessionId=<id>`
//! - Tools: topic, message, consumer group and cluster operations, each
//!   rendering a JSON document
//! - Failures are reported inside tool results, never as protocol errors

pub mod context;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod tools;
pub mod transport;

pub use handler::{create_mcp_state, McpState};
pub use protocol::{McpError, McpRequest, McpResponse};
pub use registry::McpRegistry;
pub use transport::{message_handler, sse_handler, SessionManager};
