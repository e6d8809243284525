//! API Handlers
//!
//! HTTP request handlers for the monitoring and cache administration
//! endpoints.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Json,
};
use tracing::{info, warn};

use crate::cache::{CacheManager, CacheStatsSnapshot};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{ActionResponse, HealthResponse};
use crate::perf::{PerformanceMonitor, PerformanceReport};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide cache manager
    pub cache: Arc<CacheManager>,
    /// Route timings and resource samples
    pub monitor: Arc<PerformanceMonitor>,
    /// Bearer token for admin routes; `None` disables them
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Creates a new AppState from its parts.
    pub fn new(
        cache: Arc<CacheManager>,
        monitor: Arc<PerformanceMonitor>,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            cache,
            monitor,
            admin_token: admin_token.map(Arc::from),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(CacheManager::from_config(config)),
            Arc::new(PerformanceMonitor::new()),
            config.admin_token.clone(),
        )
    }
}

/// Middleware guarding the admin routes with `Authorization: Bearer <token>`.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(CacheError::Forbidden("admin endpoints are disabled".into()));
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| CacheError::Unauthorized("missing bearer token".into()))?;

    if provided != expected {
        warn!(path = %request.uri().path(), "Rejected admin request");
        return Err(CacheError::Forbidden("invalid admin token".into()));
    }

    Ok(next.run(request).await)
}

/// Handler for GET /metrics
///
/// Returns the performance report, including cache statistics.
pub async fn metrics_handler(State(state): State<AppState>) -> Json<PerformanceReport> {
    Json(state.monitor.report(&state.cache))
}

/// Handler for GET /cache
///
/// Returns the cache manager's statistics snapshot.
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsSnapshot> {
    Json(state.cache.get_stats())
}

/// Handler for POST /reset
///
/// Clears route timings and resource samples.
pub async fn reset_handler(State(state): State<AppState>) -> Json<ActionResponse> {
    state.monitor.reset();
    info!("Performance counters reset by admin");
    Json(ActionResponse::new("Performance counters reset"))
}

/// Handler for POST /cache/flush
///
/// Clears every cache namespace.
pub async fn flush_handler(State(state): State<AppState>) -> Result<Json<ActionResponse>> {
    if state.cache.flush(None) {
        Ok(Json(ActionResponse::new("All cache namespaces flushed")))
    } else {
        Err(CacheError::Internal(
            "one or more cache namespaces could not be flushed".into(),
        ))
    }
}

/// Handler for GET /health
///
/// Unauthenticated liveness probe with uptime and memory.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let memory_mb = state.monitor.current_usage().map(|sample| sample.rss_mb);
    Json(HealthResponse::healthy(
        state.monitor.uptime().as_secs(),
        memory_mb,
    ))
}
