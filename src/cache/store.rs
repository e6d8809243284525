//! Namespace Store Module
//!
//! Backing store for a single namespace: a HashMap of entries plus an expiry
//! index ordered by expiration time, so sweeps only touch expired keys.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheEntry, NamespaceSettings};

// == Store Stats ==
/// Internal statistics of one backing store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Lookups served from this store
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Entries currently held, including expired ones not yet swept
    pub keys: usize,
    /// Approximate bytes used by keys
    pub key_bytes: usize,
    /// Approximate bytes used by serialized values
    pub value_bytes: usize,
}

#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    size: usize,
}

// == Namespace Store ==
/// Key/value storage with TTL expiry for one namespace.
#[derive(Debug)]
pub struct NamespaceStore {
    /// Key-value storage
    entries: HashMap<String, Slot>,
    /// (expires_at, key) pairs in expiry order
    expiry_index: BTreeSet<(u64, String)>,
    /// TTL policy for this namespace
    settings: NamespaceSettings,
    hits: AtomicU64,
    misses: AtomicU64,
    key_bytes: usize,
    value_bytes: usize,
}

impl NamespaceStore {
    // == Constructor ==
    /// Creates an empty store with the given TTL policy.
    pub fn new(settings: NamespaceSettings) -> Self {
        Self {
            entries: HashMap::new(),
            expiry_index: BTreeSet::new(),
            settings,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            key_bytes: 0,
            value_bytes: 0,
        }
    }

    pub fn settings(&self) -> NamespaceSettings {
        self.settings
    }

    // == Get ==
    /// Returns the live value for `key`, if any, and counts the lookup.
    ///
    /// Expired entries are reported as absent but left in place for the
    /// sweeper, so lookups never need exclusive access.
    pub fn get(&self, key: &str, now_ms: u64) -> Option<&Value> {
        let value = self.peek(key, now_ms);
        self.record_lookup(value.is_some());
        value
    }

    /// Like `get`, without touching the store's hit/miss stats.
    pub fn peek(&self, key: &str, now_ms: u64) -> Option<&Value> {
        self.entries
            .get(key)
            .filter(|slot| !slot.entry.is_expired(now_ms))
            .map(|slot| &slot.entry.value)
    }

    /// Counts one lookup whose outcome was decided by the caller.
    pub fn record_lookup(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    // == Insert ==
    /// Stores `value` under `key`, replacing any existing entry and its TTL.
    ///
    /// `ttl_seconds` of `None` applies the namespace default.
    pub fn insert(&mut self, key: String, value: Value, ttl_seconds: Option<u64>, now_ms: u64) {
        let ttl = ttl_seconds.unwrap_or(self.settings.default_ttl);
        self.remove(&key);

        let size = estimate_size(&value);
        let entry = CacheEntry::new(value, now_ms, ttl);

        self.expiry_index.insert((entry.expires_at, key.clone()));
        self.key_bytes += key.len();
        self.value_bytes += size;
        self.entries.insert(key, Slot { entry, size });
    }

    // == Remove ==
    /// Removes `key`; returns whether an entry was present.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove_entry(key) {
            Some((key, slot)) => {
                self.release(key.len(), slot.size);
                self.expiry_index.remove(&(slot.entry.expires_at, key));
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Drops every entry and resets the internal statistics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.expiry_index.clear();
        self.key_bytes = 0;
        self.value_bytes = 0;
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    // == Sweep Expired ==
    /// Removes every entry with `now >= expires_at`; returns how many.
    pub fn sweep_expired(&mut self, now_ms: u64) -> usize {
        let mut removed = 0;
        while let Some((expires_at, _)) = self.expiry_index.first() {
            if *expires_at > now_ms {
                break;
            }
            let Some((_, key)) = self.expiry_index.pop_first() else {
                break;
            };
            if let Some(slot) = self.entries.remove(&key) {
                self.release(key.len(), slot.size);
                removed += 1;
            }
        }
        removed
    }

    // == Length ==
    /// Returns the number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Stats ==
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            keys: self.entries.len(),
            key_bytes: self.key_bytes,
            value_bytes: self.value_bytes,
        }
    }

    fn release(&mut self, key_len: usize, value_size: usize) {
        self.key_bytes = self.key_bytes.saturating_sub(key_len);
        self.value_bytes = self.value_bytes.saturating_sub(value_size);
    }
}

/// Approximate in-memory footprint of a JSON document.
fn estimate_size(value: &Value) -> usize {
    match value {
        Value::Null => 4,
        Value::Bool(_) => 5,
        Value::Number(_) => 8,
        Value::String(s) => s.len(),
        Value::Array(items) => items.iter().map(estimate_size).sum::<usize>() + 2,
        Value::Object(map) => {
            map.iter()
                .map(|(k, v)| k.len() + estimate_size(v))
                .sum::<usize>()
                + 2
        }
    }
}
