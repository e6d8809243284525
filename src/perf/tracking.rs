//! Route latency middleware.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use super::PerformanceMonitor;

/// Times the wrapped handler and records it under `"<METHOD> <route>"`,
/// using the matched route template when available.
pub async fn track_request(
    State(monitor): State<Arc<PerformanceMonitor>>,
    request: Request,
    next: Next,
) -> Response {
    let route = match request.extensions().get::<MatchedPath>() {
        Some(matched) => format!("{} {}", request.method(), matched.as_str()),
        None => format!("{} {}", request.method(), request.uri().path()),
    };

    let start = Instant::now();
    let response = next.run(request).await;
    monitor.record_request(&route, start.elapsed());

    response
}
