//! Fixed-capacity recency list backing [`LocalStore`](crate::LocalStore)
//!
//! Slots live in a vector and are linked by index, so promotion and eviction
//! are O(1) without per-entry allocation. Freed slots are recycled.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

struct Slot<K, V> {
    key: K,
    value: V,
    newer: Option<usize>,
    older: Option<usize>,
}

/// Least-recently-used map with a hard capacity
pub struct RecencyList<K, V> {
    index: HashMap<K, usize, RandomState>,
    slots: Vec<Option<Slot<K, V>>>,
    newest: Option<usize>,
    oldest: Option<usize>,
    vacant: Vec<usize>,
    capacity: usize,
}

impl<K, V> RecencyList<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a list holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        Self {
            index: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            slots: Vec::with_capacity(capacity),
            newest: None,
            oldest: None,
            vacant: Vec::new(),
            capacity,
        }
    }

    /// Look up `key` and mark it most recently used
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = *self.index.get(key)?;
        self.promote(idx);
        self.slots[idx].as_mut().map(|slot| &mut slot.value)
    }

    /// Look up `key` without touching its recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Insert or replace `key`, returning the entry evicted to make room
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(slot) = self.slots[idx].as_mut() {
                slot.value = value;
            }
            self.promote(idx);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.pop_oldest()
        } else {
            None
        };

        let idx = self.claim_slot();
        self.slots[idx] = Some(Slot {
            key: key.clone(),
            value,
            newer: None,
            older: self.newest,
        });
        self.attach_newest(idx);
        self.index.insert(key, idx);

        evicted
    }

    /// Remove `key`, returning its value
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.detach(idx);
        self.vacant.push(idx);
        self.slots[idx].take().map(|slot| slot.value)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.vacant.clear();
        self.newest = None;
        self.oldest = None;
    }

    fn pop_oldest(&mut self) -> Option<(K, V)> {
        let idx = self.oldest?;
        self.detach(idx);
        self.vacant.push(idx);
        let slot = self.slots[idx].take()?;
        self.index.remove(&slot.key);
        Some((slot.key, slot.value))
    }

    fn promote(&mut self, idx: usize) {
        if self.newest == Some(idx) {
            return;
        }
        self.detach(idx);
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.newer = None;
            slot.older = self.newest;
        }
        self.attach_newest(idx);
    }

    /// Link `idx` in front of the current newest slot
    fn attach_newest(&mut self, idx: usize) {
        if let Some(prev) = self.newest {
            if let Some(slot) = self.slots[prev].as_mut() {
                slot.newer = Some(idx);
            }
        }
        self.newest = Some(idx);
        if self.oldest.is_none() {
            self.oldest = Some(idx);
        }
    }

    fn detach(&mut self, idx: usize) {
        let (newer, older) = match self.slots[idx].as_ref() {
            Some(slot) => (slot.newer, slot.older),
            None => return,
        };

        match newer {
            Some(n) => {
                if let Some(slot) = self.slots[n].as_mut() {
                    slot.older = older;
                }
            }
            None => self.newest = older,
        }

        match older {
            Some(o) => {
                if let Some(slot) = self.slots[o].as_mut() {
                    slot.newer = newer;
                }
            }
            None => self.oldest = newer,
        }
    }

    fn claim_slot(&mut self) -> usize {
        match self.vacant.pop() {
            Some(idx) => idx,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        }
    }
}
