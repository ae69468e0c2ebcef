//! Shared TTL setting for backends

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use memoproxy::DEFAULT_TTL;

/// TTL in milliseconds, settable through a shared reference
///
/// A non-zero TTL never rounds down to zero: sub-millisecond remainders round
/// up, so only `Duration::ZERO` means "never expire".
#[derive(Debug)]
pub(crate) struct TtlSetting(AtomicU64);

impl TtlSetting {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self(AtomicU64::new(to_millis(ttl)))
    }

    pub(crate) fn set(&self, ttl: Duration) {
        self.0.store(to_millis(ttl), Ordering::Relaxed);
    }

    pub(crate) fn get(&self) -> Duration {
        Duration::from_millis(self.0.load(Ordering::Relaxed))
    }

    /// TTL, or `None` when entries never expire
    pub(crate) fn expiring(&self) -> Option<Duration> {
        match self.0.load(Ordering::Relaxed) {
            0 => None,
            millis => Some(Duration::from_millis(millis)),
        }
    }

    /// TTL in whole seconds rounded up, for backends with second resolution
    pub(crate) fn expiring_secs(&self) -> Option<u64> {
        self.expiring().map(|ttl| ttl.as_millis().div_ceil(1000) as u64)
    }
}

impl Default for TtlSetting {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

fn to_millis(ttl: Duration) -> u64 {
    let millis = ttl.as_millis() + u128::from(ttl.subsec_nanos() % 1_000_000 != 0);
    u64::try_from(millis).unwrap_or(u64::MAX)
}
