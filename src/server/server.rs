use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{error, info};

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;

use super::{accept_status, log_requests, metrics::metrics_handler, state::*, ServerConfig};
use crate::mcp::{message_handler, sse_handler};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub tools: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        tools: state.mcp_state.registry.tool_count(),
    };
    Json(stats)
}

pub fn make_app(state: ServerState) -> Router {
    let config = state.config.clone();

    let mut app: Router = Router::new()
        .route("/", get(home))
        .route(&config.sse_path, get(sse_handler))
        .route(&config.message_path, post(message_handler))
        .with_state(state.clone());

    if config.accept_status_rewrite {
        app = app.layer(middleware::from_fn_with_state(config.clone(), accept_status));
    }

    app.layer(middleware::from_fn_with_state(state, log_requests))
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(config: ServerConfig, gateway: GuardedGateway) -> Result<()> {
    let metrics_address = format!("{}:{}", config.bind_address, config.metrics_port);
    let metrics_listener = TcpListener::bind(&metrics_address)
        .await
        .with_context(|| format!("Failed to bind metrics listener to {}", metrics_address))?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", e);
        }
    });
    info!("Metrics available at {}/metrics", metrics_address);

    let address = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    info!(
        "MCP endpoints: SSE at {}, messages at {}",
        config.sse_path, config.message_path
    );
    info!("Ready to serve at {}!", address);

    let app = make_app(ServerState::new(config, gateway));
    Ok(axum::serve(listener, app).await?)
}
