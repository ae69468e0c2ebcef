//! Per-fingerprint cache hit counting

use std::collections::HashMap;

use ahash::RandomState;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;

/// Counts how often each memoized result was served from cache
///
/// Counts live in process memory only. An entry is created at 0 when the
/// owning proxy stores a result and is never decremented or removed.
#[derive(Debug, Default)]
pub struct HitTracker {
    counts: Mutex<HashMap<Fingerprint, u64, RandomState>>,
}

impl HitTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `fingerprint` at zero hits
    pub fn start(&self, fingerprint: Fingerprint) {
        self.counts.lock().insert(fingerprint, 0);
    }

    /// Record a served hit and return the new count
    pub fn record_hit(&self, fingerprint: &Fingerprint) -> Result<u64> {
        let mut counts = self.counts.lock();
        match counts.get_mut(fingerprint) {
            Some(count) => {
                *count += 1;
                Ok(*count)
            }
            None => Err(Error::UnknownFingerprint(fingerprint.clone())),
        }
    }

    /// Hits recorded for `fingerprint`
    pub fn get(&self, fingerprint: &str) -> Result<u64> {
        self.counts
            .lock()
            .get(fingerprint)
            .copied()
            .ok_or_else(|| Error::UnknownFingerprint(Fingerprint::from(fingerprint)))
    }

    /// Check whether `fingerprint` is tracked
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.counts.lock().contains_key(fingerprint)
    }

    /// Number of tracked fingerprints
    pub fn len(&self) -> usize {
        self.counts.lock().len()
    }

    /// Check if nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.counts.lock().is_empty()
    }
}
