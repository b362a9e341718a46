use super::RequestsLoggingLevel;

pub const DEFAULT_SSE_PATH: &str = "/mcp/sse";
pub const DEFAULT_MESSAGE_PATH: &str = "/mcp/message";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub bind_address: String,
    pub metrics_port: u16,
    /// Where clients open the SSE stream.
    pub sse_path: String,
    /// Where clients POST their messages.
    pub message_path: String,
    /// Answer successful POSTs on `message_path` with 202 instead of 200.
    pub accept_status_rewrite: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 8080,
            bind_address: "127.0.0.1".to_string(),
            metrics_port: 9091,
            sse_path: DEFAULT_SSE_PATH.to_string(),
            message_path: DEFAULT_MESSAGE_PATH.to_string(),
            accept_status_rewrite: true,
        }
    }
}
