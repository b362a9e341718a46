use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all server metrics
const PREFIX: &str = "kafka_mcp";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Tool Metrics
    pub static ref TOOL_CALLS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_tool_calls_total"), "Total MCP tool calls"),
        &["tool", "outcome"]
    ).expect("Failed to create tool_calls_total metric");

    pub static ref TOOL_CALL_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_tool_call_duration_seconds"),
            "MCP tool call duration in seconds"
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["tool"]
    ).expect("Failed to create tool_call_duration_seconds metric");

    pub static ref SSE_SESSIONS_ACTIVE: Gauge = Gauge::new(
        format!("{PREFIX}_sse_sessions_active"),
        "Number of open MCP SSE sessions"
    ).expect("Failed to create sse_sessions_active metric");

    // Kafka Metrics
    pub static ref KAFKA_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_kafka_errors_total"), "Kafka operation failures by kind"),
        &["kind"]
    ).expect("Failed to create kafka_errors_total metric");

    pub static ref ADMIN_CLIENT_REBUILDS_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_admin_client_rebuilds_total"),
        "Times the shared admin client was rebuilt after repeated broker failures"
    ).expect("Failed to create admin_client_rebuilds_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(TOOL_CALLS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(TOOL_CALL_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(SSE_SESSIONS_ACTIVE.clone()));
    let _ = REGISTRY.register(Box::new(KAFKA_ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ADMIN_CLIENT_REBUILDS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a completed tool call. `outcome` is `success` or `error`.
pub fn record_tool_call(tool: &str, outcome: &str, duration: Duration) {
    TOOL_CALLS_TOTAL.with_label_values(&[tool, outcome]).inc();

    TOOL_CALL_DURATION_SECONDS
        .with_label_values(&[tool])
        .observe(duration.as_secs_f64());
}

pub fn set_sse_sessions(count: usize) {
    SSE_SESSIONS_ACTIVE.set(count as f64);
}

pub fn record_kafka_error(kind: &str) {
    KAFKA_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn record_admin_rebuild() {
    ADMIN_CLIENT_REBUILDS_TOTAL.inc();
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
