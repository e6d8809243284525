//! Performance Monitor
//!
//! Keeps per-route latency totals, start-up phase timings, and a rolling
//! window of process memory/CPU samples. Its report embeds the cache
//! manager's statistics so operators read both from one endpoint.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::{debug, warn};

use crate::cache::{CacheManager, CacheStatsSnapshot};

/// Number of resource samples retained.
pub const MAX_SAMPLES: usize = 60;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// == Report Types ==
/// Process memory and CPU at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceSample {
    pub at: DateTime<Utc>,
    /// Resident set size in MB
    pub rss_mb: f64,
    /// CPU usage since the previous refresh, in percent of one core
    pub cpu_percent: f32,
}

/// Latency totals for one route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteStats {
    pub count: u64,
    pub total_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
}

/// Duration of one start-up phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootstrapTiming {
    pub phase: String,
    pub duration_ms: f64,
}

/// Everything `GET /metrics` returns.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub memory: Option<ResourceSample>,
    pub samples: Vec<ResourceSample>,
    pub routes: BTreeMap<String, RouteStats>,
    pub bootstrap: Vec<BootstrapTiming>,
    pub cache: CacheStatsSnapshot,
}

#[derive(Debug, Clone, Copy)]
struct RouteTiming {
    count: u64,
    total_ms: f64,
    min_ms: f64,
    max_ms: f64,
}

impl RouteTiming {
    fn new(ms: f64) -> Self {
        Self {
            count: 1,
            total_ms: ms,
            min_ms: ms,
            max_ms: ms,
        }
    }

    fn record(&mut self, ms: f64) {
        self.count += 1;
        self.total_ms += ms;
        self.min_ms = self.min_ms.min(ms);
        self.max_ms = self.max_ms.max(ms);
    }

    fn stats(&self) -> RouteStats {
        RouteStats {
            count: self.count,
            total_ms: self.total_ms,
            min_ms: self.min_ms,
            max_ms: self.max_ms,
            avg_ms: self.total_ms / self.count as f64,
        }
    }
}

// == Performance Monitor ==
/// Process-wide performance bookkeeping.
pub struct PerformanceMonitor {
    started_at: Instant,
    pid: Option<Pid>,
    system: Mutex<System>,
    routes: Mutex<HashMap<String, RouteTiming>>,
    bootstrap: Mutex<Vec<BootstrapTiming>>,
    samples: Mutex<VecDeque<ResourceSample>>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(err) => {
                warn!(error = err, "Process id unavailable, resource sampling disabled");
                None
            }
        };

        Self {
            started_at: Instant::now(),
            pid,
            system: Mutex::new(System::new()),
            routes: Mutex::new(HashMap::new()),
            bootstrap: Mutex::new(Vec::new()),
            samples: Mutex::new(VecDeque::with_capacity(MAX_SAMPLES)),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    // == Route Timing ==
    /// Adds one request's latency to the route's totals.
    pub fn record_request(&self, route: &str, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        let mut routes = lock(&self.routes);
        match routes.get_mut(route) {
            Some(timing) => timing.record(ms),
            None => {
                routes.insert(route.to_string(), RouteTiming::new(ms));
            }
        }
    }

    // == Bootstrap Timing ==
    /// Records how long a start-up phase took.
    pub fn record_bootstrap(&self, phase: impl Into<String>, elapsed: Duration) {
        let phase = phase.into();
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        debug!(phase = %phase, duration_ms, "Bootstrap phase complete");
        lock(&self.bootstrap).push(BootstrapTiming { phase, duration_ms });
    }

    // == Resource Sampling ==
    /// Reads current process memory and CPU without storing the sample.
    pub fn current_usage(&self) -> Option<ResourceSample> {
        let pid = self.pid?;
        let mut system = lock(&self.system);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::new().with_cpu().with_memory(),
        );

        system.process(pid).map(|process| ResourceSample {
            at: Utc::now(),
            rss_mb: process.memory() as f64 / BYTES_PER_MB,
            cpu_percent: process.cpu_usage(),
        })
    }

    /// Takes a sample and appends it to the rolling window.
    pub fn sample_resources(&self) -> Option<ResourceSample> {
        let sample = self.current_usage()?;
        let mut samples = lock(&self.samples);
        if samples.len() == MAX_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(sample);
        Some(sample)
    }

    // == Report ==
    pub fn report(&self, cache: &CacheManager) -> PerformanceReport {
        let samples: Vec<ResourceSample> = lock(&self.samples).iter().copied().collect();
        let routes = lock(&self.routes)
            .iter()
            .map(|(route, timing)| (route.clone(), timing.stats()))
            .collect();

        PerformanceReport {
            generated_at: Utc::now(),
            uptime_secs: self.uptime().as_secs(),
            memory: samples.last().copied(),
            samples,
            routes,
            bootstrap: lock(&self.bootstrap).clone(),
            cache: cache.get_stats(),
        }
    }

    // == Reset ==
    /// Clears route timings and resource samples; bootstrap timings stay.
    pub fn reset(&self) {
        lock(&self.routes).clear();
        lock(&self.samples).clear();
        debug!("Performance counters reset");
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
