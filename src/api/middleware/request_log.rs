use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{error, info, warn};

/// One log line per request: client, method, path, status and latency.
///
/// Server errors log at `error`, client errors at `warn`.
pub async fn request_log_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis();

    if response.status().is_server_error() {
        error!(%client, %method, %path, status, %latency_ms, "request_completed");
    } else if response.status().is_client_error() {
        warn!(%client, %method, %path, status, %latency_ms, "request_completed");
    } else {
        info!(%client, %method, %path, status, %latency_ms, "request_completed");
    }

    response
}
