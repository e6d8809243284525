//! Cache Statistics Module
//!
//! Process-wide operation counters shared by every namespace.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Operation Counters ==
/// Running totals of hits, misses, sets, and deletes.
///
/// Observability only; no cache decision reads these.
#[derive(Debug, Default)]
pub struct OperationCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    dels: AtomicU64,
}

impl OperationCounters {
    // == Constructor ==
    /// Creates counters starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_del(&self) {
        self.dels.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Reads all counters without mutating them.
    pub fn snapshot(&self) -> OperationStats {
        OperationStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            dels: self.dels.load(Ordering::Relaxed),
        }
    }

    // == Reset ==
    /// Zeroes every counter.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.sets.store(0, Ordering::Relaxed);
        self.dels.store(0, Ordering::Relaxed);
    }
}

// == Operation Stats ==
/// Point-in-time copy of the operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub dels: u64,
}

impl OperationStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
