//! 200 to 202 rewrite for the MCP message endpoint.
//!
//! Some MCP hosts treat anything but `202 Accepted` from the message endpoint
//! as a failed delivery. Only successful POSTs to exactly the configured
//! message path are touched; headers and body pass through as they are.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::server::ServerConfig;

fn applies_to(config: &ServerConfig, method: &Method, path: &str) -> bool {
    config.accept_status_rewrite && method == Method::POST && path == config.message_path
}

pub async fn accept_status(
    State(config): State<ServerConfig>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let rewrite = applies_to(&config, request.method(), request.uri().path());

    let mut response = next.run(request).await;
    if rewrite && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::ACCEPTED;
    }
    response
}
