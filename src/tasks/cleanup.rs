//! TTL Sweep Tasks
//!
//! Background tasks that periodically remove expired cache entries, one
//! per namespace, each on that namespace's check period.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheManager, Namespace};

/// Spawns a background task that sweeps one namespace every `interval`.
///
/// The task runs in an infinite loop, sleeping between sweeps. The returned
/// handle is aborted during graceful shutdown.
pub fn spawn_sweep_task(
    cache: Arc<CacheManager>,
    namespace: Namespace,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            %namespace,
            "Starting TTL sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep_expired(namespace);
            if removed > 0 {
                info!(%namespace, "TTL sweep: removed {} expired entries", removed);
            } else {
                debug!(%namespace, "TTL sweep: no expired entries found");
            }
        }
    })
}

/// Spawns one sweep task per namespace using its configured check period.
///
/// A check period of zero is treated as one second.
pub fn spawn_sweep_tasks(cache: &Arc<CacheManager>) -> Vec<JoinHandle<()>> {
    Namespace::ALL
        .iter()
        .map(|&namespace| {
            let period = cache.settings(namespace).check_period.max(1);
            spawn_sweep_task(cache.clone(), namespace, Duration::from_secs(period))
        })
        .collect()
}
