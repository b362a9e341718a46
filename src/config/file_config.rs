use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub bootstrap_servers: Option<String>,
    pub client_id: Option<String>,
    pub operation_timeout_sec: Option<u64>,

    /// Raw librdkafka properties, e.g. `"security.protocol" = "SASL_SSL"`.
    pub kafka: Option<BTreeMap<String, toml::Value>>,
    pub mcp: Option<McpFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct McpFileConfig {
    pub sse_path: Option<String>,
    pub message_path: Option<String>,
    pub accept_status_rewrite: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
