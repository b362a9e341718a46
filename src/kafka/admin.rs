//! Shared admin client with rebuild-on-persistent-failure.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use rdkafka::admin::AdminClient;
use rdkafka::client::DefaultClientContext;
use tracing::{info, warn};

use super::client_config::KafkaSettings;
use super::error::{KafkaOpsError, KafkaResult};
use crate::server::metrics::record_admin_rebuild;

pub type SharedAdmin = Arc<AdminClient<DefaultClientContext>>;

/// Consecutive broker-unavailable outcomes before the client is rebuilt.
pub const REBUILD_THRESHOLD: u32 = 2;

/// Tracks consecutive transport failures. Kept separate from the client so
/// the policy can be tested without a broker.
#[derive(Debug, Default)]
pub struct FailureTracker {
    consecutive: AtomicU32,
}

impl FailureTracker {
    /// Records an outcome; returns true when the client should be rebuilt.
    pub fn record<T>(&self, outcome: &KafkaResult<T>) -> bool {
        match outcome {
            Err(e) if e.is_broker_unavailable() => {
                let failures = self.consecutive.fetch_add(1, Ordering::SeqCst) + 1;
                failures >= REBUILD_THRESHOLD
            }
            _ => {
                self.consecutive.store(0, Ordering::SeqCst);
                false
            }
        }
    }

    pub fn reset(&self) {
        self.consecutive.store(0, Ordering::SeqCst);
    }

    pub fn failures(&self) -> u32 {
        self.consecutive.load(Ordering::SeqCst)
    }
}

pub struct AdminHandle {
    settings: KafkaSettings,
    client: RwLock<SharedAdmin>,
    failures: FailureTracker,
}

impl AdminHandle {
    pub fn new(settings: KafkaSettings) -> KafkaResult<Self> {
        let client = Self::build(&settings)?;
        Ok(Self {
            settings,
            client: RwLock::new(client),
            failures: FailureTracker::default(),
        })
    }

    fn build(settings: &KafkaSettings) -> KafkaResult<SharedAdmin> {
        let client = settings
            .client_config()
            .create::<AdminClient<DefaultClientContext>>()
            .map_err(|e| KafkaOpsError::from_kafka(e, "admin client"))?;
        Ok(Arc::new(client))
    }

    /// Current client. Callers hold the `Arc`, so a concurrent rebuild never
    /// pulls the client out from under an in-flight request.
    pub fn client(&self) -> KafkaResult<SharedAdmin> {
        self.client
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| KafkaOpsError::Internal("admin client lock poisoned".to_string()))
    }

    /// Feeds an operation outcome into the failure tracker, rebuilding the
    /// client once the threshold is reached. The outcome is returned as-is.
    pub fn observe<T>(&self, outcome: KafkaResult<T>) -> KafkaResult<T> {
        if self.failures.record(&outcome) {
            self.rebuild();
        }
        outcome
    }

    fn rebuild(&self) {
        warn!(
            "Admin client failed {} consecutive times, rebuilding",
            self.failures.failures()
        );
        match Self::build(&self.settings) {
            Ok(client) => match self.client.write() {
                Ok(mut guard) => {
                    *guard = client;
                    self.failures.reset();
                    record_admin_rebuild();
                    info!("Admin client rebuilt");
                }
                Err(_) => warn!("Admin client lock poisoned, keeping the old client"),
            },
            Err(e) => warn!("Failed to rebuild admin client: {}", e),
        }
    }
}
