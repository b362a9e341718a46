use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kafka_mcp_server::config::{AppConfig, CliConfig, FileConfig};
use kafka_mcp_server::server::metrics;
use kafka_mcp_server::{run_server, KafkaGateway, RdKafkaGateway, RequestsLoggingLevel};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values there override the flags below.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8080)]
    pub port: u16,

    /// The address to bind the HTTP listeners to.
    #[clap(long, default_value = "127.0.0.1")]
    pub bind_address: String,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Comma separated list of Kafka brokers.
    #[clap(long, env = "KAFKA_BOOTSTRAP_SERVERS", default_value = "localhost:9092")]
    pub bootstrap_servers: String,

    /// Client id reported to the brokers.
    #[clap(long, default_value = "kafka-mcp-server")]
    pub client_id: String,

    /// Timeout in seconds for admin requests, metadata lookups and produce deliveries.
    #[clap(long, default_value_t = 30)]
    pub operation_timeout_sec: u64,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            port: self.port,
            bind_address: self.bind_address.clone(),
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            bootstrap_servers: self.bootstrap_servers.clone(),
            client_id: self.client_id.clone(),
            operation_timeout_sec: self.operation_timeout_sec,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Initializing metrics...");
    metrics::init_metrics();

    info!(
        "Connecting to Kafka at {}...",
        app_config.kafka.bootstrap_servers().unwrap_or_default()
    );
    let gateway: Arc<dyn KafkaGateway> = Arc::new(
        RdKafkaGateway::new(app_config.kafka.clone()).context("Failed to create Kafka clients")?,
    );

    run_server(app_config.server_config(), gateway).await
}
