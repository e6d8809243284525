//! Namespaced Cache - in-process TTL cache with HTTP response caching
//!
//! Provides a namespaced key/value cache with per-namespace TTL policies,
//! Axum middleware that caches JSON responses, and a small admin API for
//! metrics and cache control.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod perf;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheManager, Namespace};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::BackgroundTasks;
