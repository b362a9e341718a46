use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use crate::kafka::KafkaGateway;
use crate::mcp::{create_mcp_state, McpState, SessionManager};

use super::ServerConfig;

pub type GuardedGateway = Arc<dyn KafkaGateway>;
pub type GuardedMcpState = Arc<McpState>;
pub type GuardedSessionManager = Arc<SessionManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub gateway: GuardedGateway,
    pub mcp_state: GuardedMcpState,
    pub sessions: GuardedSessionManager,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, gateway: GuardedGateway) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            gateway,
            mcp_state: Arc::new(create_mcp_state()),
            sessions: Arc::new(SessionManager::new()),
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedGateway {
    fn from_ref(input: &ServerState) -> Self {
        input.gateway.clone()
    }
}

impl FromRef<ServerState> for GuardedMcpState {
    fn from_ref(input: &ServerState) -> Self {
        input.mcp_state.clone()
    }
}

impl FromRef<ServerState> for GuardedSessionManager {
    fn from_ref(input: &ServerState) -> Self {
        input.sessions.clone()
    }
}
