//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, ORDERS_TOPIC};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_describe_topic() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!     let mut session = client.initialized_session(&server.config.sse_path).await;
//!
//!     let topic = session
//!         .call_tool("describeTopic", json!({"topicName": ORDERS_TOPIC}))
//!         .await;
//!     assert_eq!(topic["name"], ORDERS_TOPIC);
//! }
//! ```

#![allow(dead_code)]

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::{McpSession, SseEvent, TestClient};
pub use constants::*;
pub use fixtures::InMemoryGateway;
pub use server::TestServer;
