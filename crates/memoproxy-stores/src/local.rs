//! LocalStore: bounded single-process cache with expiry

use std::time::{Duration, Instant};

use memoproxy::{CacheStore, StoreError, Value};
use parking_lot::Mutex;
use tracing::trace;

use crate::lru::RecencyList;
use crate::stats::CacheStats;
use crate::ttl::TtlSetting;

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

/// Process-local cache with LRU eviction and per-entry expiry
///
/// Each entry gets a deadline from the TTL in force when it is written.
/// Expired entries are invisible to `has` and `get` and are dropped the next
/// time they are looked at. When full, the least recently used entry is
/// evicted.
pub struct LocalStore {
    entries: Mutex<RecencyList<String, Entry>>,
    ttl: TtlSetting,
    stats: CacheStats,
}

impl LocalStore {
    /// Create a store holding at most `capacity` entries
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(RecencyList::new(capacity)),
            ttl: TtlSetting::default(),
            stats: CacheStats::new(),
        }
    }

    /// Number of entries, including expired ones not yet dropped
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.entries.lock().capacity()
    }

    /// Drop every entry and reset statistics
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.stats.reset();
    }

    /// Get store statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Live value for `key`; `promote` marks it most recently used
    fn lookup_at(&self, key: &str, now: Instant, promote: bool) -> Option<Value> {
        let key = key.to_string();
        let mut entries = self.entries.lock();

        let entry = if promote {
            entries.get_mut(&key).map(|entry| &*entry)
        } else {
            entries.peek(&key)
        };
        match entry {
            Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }

        trace!(key = %key, "entry expired");
        entries.remove(&key);
        self.stats.record_expiration();
        None
    }

    fn has_at(&self, key: &str, now: Instant) -> bool {
        let found = self.lookup_at(key, now, false).is_some();
        if !found {
            self.stats.record_miss();
        }
        found
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        let value = self.lookup_at(key, now, true);
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    fn set_at(&self, key: &str, value: &Value, now: Instant) {
        let entry = Entry {
            value: value.clone(),
            // A deadline past what `Instant` can hold is treated as none
            expires_at: self.ttl.expiring().and_then(|ttl| now.checked_add(ttl)),
        };

        let evicted = self.entries.lock().insert(key.to_string(), entry);
        if let Some((old_key, _)) = evicted {
            trace!(key = %old_key, "entry evicted");
            self.stats.record_eviction();
        }
        self.stats.record_set();
    }
}

impl CacheStore for LocalStore {
    fn has(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.has_at(key, Instant::now()))
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.get_at(key, Instant::now()))
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.set_at(key, value, Instant::now());
        Ok(())
    }

    fn configure_ttl(&self, ttl: Duration) {
        self.ttl.set(ttl);
    }

    fn ttl(&self) -> Duration {
        self.ttl.get()
    }
}
