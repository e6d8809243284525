//! Performance Module
//!
//! Route latency tracking, start-up timings, and process resource samples,
//! reported together with the cache statistics.

mod monitor;
mod tracking;

pub use monitor::{
    BootstrapTiming, PerformanceMonitor, PerformanceReport, ResourceSample, RouteStats,
    MAX_SAMPLES,
};
pub use tracking::track_request;
