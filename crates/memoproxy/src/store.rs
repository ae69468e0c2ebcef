//! Cache backend contract

use std::time::Duration;

use crate::error::StoreError;
use crate::value::Value;

/// TTL handed to a store when none is given on attach
pub const DEFAULT_TTL: Duration = Duration::from_secs(120);

/// Key/value backend the proxy memoizes into
///
/// Implementations own their concurrency discipline and must be usable from
/// several threads. The proxy relies on one guarantee only: a `get` issued
/// right after `has` returned `true` for the same key observes the entry.
///
/// The TTL is configured once per proxy/store binding and applies to entries
/// written after the call. A zero TTL means entries never expire.
pub trait CacheStore: Send + Sync {
    /// Check whether a live entry exists for `key`
    fn has(&self, key: &str) -> Result<bool, StoreError>;

    /// Read the entry for `key`
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write `value` under `key`, replacing any previous entry
    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Set the TTL for entries written from now on
    fn configure_ttl(&self, ttl: Duration);

    /// Current TTL
    fn ttl(&self) -> Duration;
}
