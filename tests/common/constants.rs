//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the seeded cluster changes (topics, groups, brokers),
//! update only this file.

// ============================================================================
// Seeded Cluster
// ============================================================================

/// Cluster id reported by describeCluster
pub const CLUSTER_ID: &str = "test-cluster-0001";

/// Number of brokers in the seeded cluster (ids 1..=BROKER_COUNT)
pub const BROKER_COUNT: i32 = 3;

/// Broker id of the elected controller
pub const CONTROLLER_ID: i32 = 2;

/// Topic present at startup, pre-filled with ORDERS_SEEDED_MESSAGES records on partition 0
pub const ORDERS_TOPIC: &str = "orders";

/// Partition count of ORDERS_TOPIC
pub const ORDERS_PARTITIONS: i32 = 3;

/// Records already on partition 0 of ORDERS_TOPIC
pub const ORDERS_SEEDED_MESSAGES: usize = 4;

/// Empty topic present at startup
pub const AUDIT_TOPIC: &str = "audit-log";

/// Consumer group present at startup, one member reading ORDERS_TOPIC
pub const BILLING_GROUP: &str = "billing-service";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Timeout for plain HTTP requests
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum time to wait for the next SSE event
pub const SSE_EVENT_TIMEOUT_MS: u64 = 15_000;
