//! Cache Module
//!
//! Provides a namespaced in-memory cache with TTL expiration and
//! process-wide operation counters.

mod clock;
mod entry;
mod manager;
mod namespace;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use manager::{CacheManager, CacheStatsSnapshot, NamespaceStats};
pub use namespace::{Namespace, NamespaceSettings};
pub use stats::{OperationCounters, OperationStats};
pub use store::{NamespaceStore, StoreStats};
