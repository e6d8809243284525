//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Sweep: Removes expired cache entries, one task per namespace
//! - Stats Reporter: Logs the cache hit rate at a fixed interval
//! - Resource Sampler: Records process memory and CPU usage

mod cleanup;
mod reporter;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::CacheManager;
use crate::config::Config;
use crate::perf::PerformanceMonitor;

pub use cleanup::{spawn_sweep_task, spawn_sweep_tasks};
pub use reporter::{spawn_resource_sampler, spawn_stats_reporter};

/// Handles of every background task started by [`BackgroundTasks::spawn`].
pub struct BackgroundTasks {
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    /// Starts the sweepers, the stats reporter and the resource sampler.
    pub fn spawn(
        config: &Config,
        cache: &Arc<CacheManager>,
        monitor: &Arc<PerformanceMonitor>,
    ) -> Self {
        let mut handles = spawn_sweep_tasks(cache);
        handles.push(spawn_stats_reporter(
            cache.clone(),
            Duration::from_secs(config.stats_report_interval.max(1)),
            config.stats_reset_on_report,
        ));
        handles.push(spawn_resource_sampler(
            monitor.clone(),
            Duration::from_secs(config.resource_sample_interval.max(1)),
        ));

        info!("{} background tasks started", handles.len());
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Aborts every task, then releases all cached entries.
    pub fn shutdown(self, cache: &CacheManager) {
        for handle in &self.handles {
            handle.abort();
        }
        info!("{} background tasks aborted", self.handles.len());
        cache.shutdown();
    }
}
