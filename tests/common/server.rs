//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server backed by its own in-memory cluster.

use super::constants::*;
use super::fixtures::InMemoryGateway;
use kafka_mcp_server::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Test server instance with an isolated in-memory cluster
///
/// When dropped, the server is signalled to shut down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// The configuration the app was built with
    pub config: ServerConfig,

    /// The cluster behind the server, for direct assertions in tests
    pub gateway: Arc<InMemoryGateway>,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server over the seeded cluster with default MCP paths
    pub async fn spawn() -> Self {
        Self::spawn_with(ServerConfig::default(), InMemoryGateway::seeded()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// The port and logging level of `config` are replaced; everything else
    /// (paths, status rewrite) is used as given.
    ///
    /// # Panics
    ///
    /// Panics if binding fails or the server doesn't become ready in time.
    pub async fn spawn_with(config: ServerConfig, gateway: InMemoryGateway) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            ..config
        };

        let gateway = Arc::new(gateway);
        let app = make_app(ServerState::new(config.clone(), gateway.clone()));

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            config,
            gateway,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the status endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
