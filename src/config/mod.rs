mod file_config;

pub use file_config::{FileConfig, McpFileConfig};

use crate::kafka::KafkaSettings;
use crate::server::config::{DEFAULT_MESSAGE_PATH, DEFAULT_SSE_PATH};
use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::collections::BTreeMap;
use std::time::Duration;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub port: u16,
    pub bind_address: String,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub bootstrap_servers: String,
    pub client_id: String,
    pub operation_timeout_sec: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            port: 8080,
            bind_address: "127.0.0.1".to_string(),
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            bootstrap_servers: "localhost:9092".to_string(),
            client_id: "kafka-mcp-server".to_string(),
            operation_timeout_sec: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub bind_address: String,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,

    pub kafka: KafkaSettings,
    pub mcp: McpSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct McpSettings {
    pub sse_path: String,
    pub message_path: String,
    pub accept_status_rewrite: bool,
}

impl Default for McpSettings {
    fn default() -> Self {
        McpSettings {
            sse_path: DEFAULT_SSE_PATH.to_string(),
            message_path: DEFAULT_MESSAGE_PATH.to_string(),
            accept_status_rewrite: true,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let bind_address = file
            .bind_address
            .unwrap_or_else(|| cli.bind_address.clone());
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let operation_timeout_sec = file
            .operation_timeout_sec
            .unwrap_or(cli.operation_timeout_sec);
        if operation_timeout_sec == 0 {
            bail!("operation_timeout_sec must be at least 1");
        }

        // [kafka] entries win over the dedicated keys.
        let mut properties = BTreeMap::new();
        properties.insert(
            "bootstrap.servers".to_string(),
            file.bootstrap_servers
                .unwrap_or_else(|| cli.bootstrap_servers.clone()),
        );
        properties.insert(
            "client.id".to_string(),
            file.client_id.unwrap_or_else(|| cli.client_id.clone()),
        );
        for (key, value) in file.kafka.unwrap_or_default() {
            let value = kafka_property_value(&key, value)?;
            properties.insert(key, value);
        }

        let kafka = KafkaSettings {
            properties,
            operation_timeout: Duration::from_secs(operation_timeout_sec),
        };
        if kafka
            .bootstrap_servers()
            .map_or(true, |servers| servers.trim().is_empty())
        {
            bail!("bootstrap servers must not be empty");
        }

        let mcp_file = file.mcp.unwrap_or_default();
        let defaults = McpSettings::default();
        let mcp = McpSettings {
            sse_path: mcp_file.sse_path.unwrap_or(defaults.sse_path),
            message_path: mcp_file.message_path.unwrap_or(defaults.message_path),
            accept_status_rewrite: mcp_file
                .accept_status_rewrite
                .unwrap_or(defaults.accept_status_rewrite),
        };
        for (name, path) in [("sse_path", &mcp.sse_path), ("message_path", &mcp.message_path)] {
            if !path.starts_with('/') {
                bail!("{} must start with '/': {}", name, path);
            }
        }
        if mcp.sse_path == mcp.message_path {
            bail!(
                "sse_path and message_path must differ (both are {})",
                mcp.sse_path
            );
        }

        Ok(AppConfig {
            port,
            bind_address,
            metrics_port,
            logging_level,
            kafka,
            mcp,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            bind_address: self.bind_address.clone(),
            metrics_port: self.metrics_port,
            sse_path: self.mcp.sse_path.clone(),
            message_path: self.mcp.message_path.clone(),
            accept_status_rewrite: self.mcp.accept_status_rewrite,
        }
    }
}

fn kafka_property_value(key: &str, value: toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        other => bail!(
            "kafka property '{}' must be a string, number or boolean, got {}",
            key,
            other.type_str()
        ),
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
