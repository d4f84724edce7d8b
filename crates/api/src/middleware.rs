use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{info, warn};

/// Log method, path, status and latency of every request.
pub async fn trace_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        warn!(%method, %path, status, elapsed_ms, "request failed");
    } else {
        info!(%method, %path, status, elapsed_ms, "request");
    }
    response
}
