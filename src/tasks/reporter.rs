//! Periodic Reporting Tasks
//!
//! Hit-rate logging for the cache and memory/CPU sampling for the
//! performance monitor.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheManager;
use crate::perf::PerformanceMonitor;

/// Spawns a task that logs cache statistics every `interval`.
///
/// With `reset_after_report` the operation counters are zeroed after each
/// line so every report covers one interval.
pub fn spawn_stats_reporter(
    cache: Arc<CacheManager>,
    interval: Duration,
    reset_after_report: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            reset_after_report,
            "Starting cache stats reporter with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            cache.report();
            if reset_after_report {
                cache.reset_stats();
            }
        }
    })
}

/// Spawns a task that samples process memory and CPU every `interval`.
pub fn spawn_resource_sampler(
    monitor: Arc<PerformanceMonitor>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting resource sampler with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match monitor.sample_resources() {
                Some(sample) => debug!(
                    rss_mb = sample.rss_mb,
                    cpu_percent = sample.cpu_percent,
                    "Resource sample"
                ),
                None => debug!("Resource sample unavailable"),
            }
        }
    })
}
