//! Cache Manager Module
//!
//! Process-wide, namespaced key/value cache with TTL expiry and operation
//! counters. Has no knowledge of HTTP.
//!
//! Every public operation is infallible from the caller's point of view:
//! backing-store faults are logged with namespace and key, then degraded to a
//! miss (`get`) or `false` (`set`, `del`). A poisoned namespace stays out of
//! service until it is flushed.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{
    Clock, Namespace, NamespaceSettings, NamespaceStore, OperationCounters, OperationStats,
    StoreStats, SystemClock,
};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Stats Snapshot ==
/// Statistics of a single namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NamespaceStats {
    pub keys: usize,
    pub stats: StoreStats,
}

/// Read-only view returned by `CacheManager::get_stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    pub operations: OperationStats,
    pub namespaces: BTreeMap<Namespace, NamespaceStats>,
}

impl CacheStatsSnapshot {
    /// Total entries across all namespaces.
    pub fn total_keys(&self) -> usize {
        self.namespaces.values().map(|ns| ns.keys).sum()
    }
}

// == Cache Manager ==
/// Namespaced TTL cache shared by the whole process.
///
/// Construct one at start-up and hand an `Arc<CacheManager>` to the HTTP
/// middleware and background tasks.
#[derive(Debug)]
pub struct CacheManager {
    /// One store per namespace, indexed by `Namespace::index`
    stores: [RwLock<NamespaceStore>; Namespace::COUNT],
    counters: OperationCounters,
    clock: Arc<dyn Clock>,
}

impl CacheManager {
    // == Constructor ==
    /// Creates a manager with per-namespace overrides; namespaces without an
    /// override use `NamespaceSettings::defaults_for`.
    pub fn new(
        overrides: impl IntoIterator<Item = (Namespace, NamespaceSettings)>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut settings = Namespace::ALL.map(NamespaceSettings::defaults_for);
        for (namespace, value) in overrides {
            settings[namespace.index()] = value;
        }

        Self {
            stores: settings.map(|s| RwLock::new(NamespaceStore::new(s))),
            counters: OperationCounters::new(),
            clock,
        }
    }

    /// Creates a manager with built-in settings and the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::new(std::iter::empty(), clock)
    }

    /// Creates a manager from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.namespaces.clone(), Arc::new(SystemClock))
    }

    // == Get ==
    /// Returns the live value for `key` in `namespace`.
    ///
    /// Absent, expired, and unreadable entries all count as a miss.
    pub fn get(&self, namespace: Namespace, key: &str) -> Option<Value> {
        self.lookup(namespace, key, |value| Ok(value.clone()))
    }

    /// Typed variant of `get`; a value that does not deserialize into `T`
    /// is treated as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, namespace: Namespace, key: &str) -> Option<T> {
        self.lookup(namespace, key, |value| Ok(T::deserialize(value)?))
    }

    fn lookup<T>(
        &self,
        namespace: Namespace,
        key: &str,
        decode: impl FnOnce(&Value) -> Result<T>,
    ) -> Option<T> {
        match self.try_get(namespace, key, decode) {
            Ok(Some(value)) => {
                self.counters.record_hit();
                debug!(%namespace, key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                self.counters.record_miss();
                debug!(%namespace, key, "Cache miss");
                None
            }
            Err(err) => {
                self.counters.record_miss();
                warn!(%namespace, key, error = %err, "Cache get failed, treating as miss");
                None
            }
        }
    }

    /// Decodes under the read lock so the store's own hit/miss stats agree
    /// with the process-wide counters.
    fn try_get<T>(
        &self,
        namespace: Namespace,
        key: &str,
        decode: impl FnOnce(&Value) -> Result<T>,
    ) -> Result<Option<T>> {
        let store = self.read(namespace)?;
        let outcome = store
            .peek(key, self.clock.now_ms())
            .map(decode)
            .transpose();
        store.record_lookup(matches!(outcome, Ok(Some(_))));
        outcome
    }

    // == Set ==
    /// Stores `value` under `key`, overwriting any existing entry.
    ///
    /// `ttl_seconds` of `None` applies the namespace default. Returns whether
    /// the value was stored.
    pub fn set<T: Serialize + ?Sized>(
        &self,
        namespace: Namespace,
        key: &str,
        value: &T,
        ttl_seconds: Option<u64>,
    ) -> bool {
        match self.try_set(namespace, key, value, ttl_seconds) {
            Ok(()) => {
                self.counters.record_set();
                debug!(%namespace, key, ttl = ?ttl_seconds, "Cache set");
                true
            }
            Err(err) => {
                warn!(%namespace, key, error = %err, "Cache set failed");
                false
            }
        }
    }

    fn try_set<T: Serialize + ?Sized>(
        &self,
        namespace: Namespace,
        key: &str,
        value: &T,
        ttl_seconds: Option<u64>,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut store = self.write(namespace)?;
        store.insert(key.to_string(), value, ttl_seconds, self.clock.now_ms());
        Ok(())
    }

    // == Delete ==
    /// Removes `key`; returns whether an entry was deleted.
    pub fn del(&self, namespace: Namespace, key: &str) -> bool {
        match self.write(namespace).map(|mut store| store.remove(key)) {
            Ok(true) => {
                self.counters.record_del();
                debug!(%namespace, key, "Cache delete");
                true
            }
            Ok(false) => false,
            Err(err) => {
                warn!(%namespace, key, error = %err, "Cache delete failed");
                false
            }
        }
    }

    // == Flush ==
    /// Clears one namespace, or every namespace when `namespace` is `None`.
    ///
    /// Poisoned stores are recovered rather than skipped, so this returns
    /// `true` once every targeted store is empty.
    pub fn flush(&self, namespace: Option<Namespace>) -> bool {
        let targets: Vec<Namespace> = match namespace {
            Some(ns) => vec![ns],
            None => Namespace::ALL.to_vec(),
        };

        for ns in targets {
            self.clear_store(ns);
        }

        match namespace {
            Some(ns) => info!(namespace = %ns, "Cache namespace flushed"),
            None => info!("All cache namespaces flushed"),
        }
        true
    }

    /// Empties one store. A poisoned store is emptied too and its lock
    /// unpoisoned, so a flush brings a faulted namespace back into service.
    fn clear_store(&self, namespace: Namespace) {
        let lock = &self.stores[namespace.index()];
        match lock.write() {
            Ok(mut store) => store.clear(),
            Err(poisoned) => {
                poisoned.into_inner().clear();
                lock.clear_poison();
                warn!(%namespace, "Recovered poisoned cache store by flushing it");
            }
        }
    }

    // == Stats ==
    /// Returns counters and per-namespace store statistics without
    /// mutating either.
    pub fn get_stats(&self) -> CacheStatsSnapshot {
        let namespaces = Namespace::ALL
            .into_iter()
            .map(|ns| {
                let store = self.stores[ns.index()]
                    .read()
                    .unwrap_or_else(PoisonError::into_inner);
                let stats = store.stats();
                (
                    ns,
                    NamespaceStats {
                        keys: stats.keys,
                        stats,
                    },
                )
            })
            .collect();

        CacheStatsSnapshot {
            operations: self.counters.snapshot(),
            namespaces,
        }
    }

    /// Logs a one-line summary of the counters and returns the snapshot.
    pub fn report(&self) -> CacheStatsSnapshot {
        let snapshot = self.get_stats();
        let ops = snapshot.operations;
        info!(
            hits = ops.hits,
            misses = ops.misses,
            sets = ops.sets,
            dels = ops.dels,
            keys = snapshot.total_keys(),
            "Cache hit rate {:.2}%",
            ops.hit_rate() * 100.0
        );
        snapshot
    }

    /// Zeroes the process-wide operation counters.
    pub fn reset_stats(&self) {
        self.counters.reset();
        info!("Cache operation counters reset");
    }

    // == Sweep ==
    /// Removes expired entries from one namespace; returns how many.
    pub fn sweep_expired(&self, namespace: Namespace) -> usize {
        match self.write(namespace) {
            Ok(mut store) => store.sweep_expired(self.clock.now_ms()),
            Err(err) => {
                warn!(%namespace, error = %err, "Cache sweep skipped");
                0
            }
        }
    }

    /// TTL policy of a namespace.
    pub fn settings(&self, namespace: Namespace) -> NamespaceSettings {
        self.stores[namespace.index()]
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .settings()
    }

    // == Shutdown ==
    /// Flushes every namespace.
    pub fn shutdown(&self) {
        self.flush(None);
        info!("Cache manager shut down");
    }

    fn read(&self, namespace: Namespace) -> Result<RwLockReadGuard<'_, NamespaceStore>> {
        self.stores[namespace.index()]
            .read()
            .map_err(|_| CacheError::StoreUnavailable(namespace.to_string()))
    }

    fn write(&self, namespace: Namespace) -> Result<RwLockWriteGuard<'_, NamespaceStore>> {
        self.stores[namespace.index()]
            .write()
            .map_err(|_| CacheError::StoreUnavailable(namespace.to_string()))
    }

    /// Poisons one namespace's lock the way a panicking writer would.
    #[cfg(test)]
    pub(crate) fn poison_namespace(&self, namespace: Namespace) {
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = self.stores[namespace.index()].write();
                    panic!("poisoning {namespace} store");
                })
                .join();
        });
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}
