//! API Routes
//!
//! Configures the Axum router with the monitoring and admin endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, flush_handler, health_handler, metrics_handler, require_admin,
    reset_handler, AppState,
};
use crate::perf::track_request;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /metrics` - Performance report (admin)
/// - `GET /cache` - Cache statistics (admin)
/// - `POST /reset` - Reset performance counters (admin)
/// - `POST /cache/flush` - Flush every cache namespace (admin)
/// - `GET /health` - Liveness probe
///
/// # Middleware
/// - Admin guard: bearer token on every route except `/health`
/// - Route timing: feeds the performance monitor
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/cache", get(cache_stats_handler))
        .route("/reset", post(reset_handler))
        .route("/cache/flush", post(flush_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn_with_state(
            state.monitor.clone(),
            track_request,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
