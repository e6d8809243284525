//! API Module
//!
//! HTTP handlers and routing for the monitoring and cache admin API.
//!
//! # Endpoints
//! - `GET /metrics` - Performance report with cache statistics
//! - `GET /cache` - Cache statistics snapshot
//! - `POST /reset` - Reset performance counters
//! - `POST /cache/flush` - Flush every cache namespace
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
