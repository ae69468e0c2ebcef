//! MemoryStore: unbounded in-process map

use std::collections::HashMap;
use std::time::Duration;

use ahash::RandomState;
use memoproxy::{CacheStore, StoreError, Value};
use parking_lot::RwLock;

use crate::stats::CacheStats;
use crate::ttl::TtlSetting;

struct Item {
    value: Value,
    ttl: Duration,
}

/// In-memory store that keeps every entry for the life of the process
///
/// The TTL in force at write time is recorded with each entry but never
/// enforced, which makes this store suitable for tests and short-lived
/// programs.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, Item, RandomState>>,
    ttl: TtlSetting,
    stats: CacheStats,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL recorded when `key` was written
    pub fn entry_ttl(&self, key: &str) -> Option<Duration> {
        self.items.read().get(key).map(|item| item.ttl)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Get store statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl CacheStore for MemoryStore {
    fn has(&self, key: &str) -> Result<bool, StoreError> {
        let found = self.items.read().contains_key(key);
        if !found {
            self.stats.record_miss();
        }
        Ok(found)
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let value = self.items.read().get(key).map(|item| item.value.clone());
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let item = Item {
            value: value.clone(),
            ttl: self.ttl.get(),
        };
        self.items.write().insert(key.to_string(), item);
        self.stats.record_set();
        Ok(())
    }

    fn configure_ttl(&self, ttl: Duration) {
        self.ttl.set(ttl);
    }

    fn ttl(&self) -> Duration {
        self.ttl.get()
    }
}
