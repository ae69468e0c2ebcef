//! RedisStore: networked key/value cache
//!
//! Values are stored as JSON strings under `<prefix><fingerprint>` and expire
//! server-side through `SET ... EX`, with the TTL rounded up to whole seconds.
//! Several processes may share one server; concurrent writers of the same key
//! simply overwrite each other.

use std::time::Duration;

use memoproxy::{CacheStore, StoreError, Value};
use parking_lot::Mutex;
use redis::{Client, Connection};
use tracing::info;

use crate::ttl::TtlSetting;

/// Key prefix used unless [`RedisStore::with_prefix`] overrides it
pub const DEFAULT_PREFIX: &str = "memoproxy:";

/// Cache store backed by a Redis server
pub struct RedisStore {
    conn: Mutex<Connection>,
    prefix: String,
    ttl: TtlSetting,
}

impl RedisStore {
    /// Connect to the server at `url`, e.g. `redis://127.0.0.1:6379`
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(StoreError::backend)?;
        let conn = client.get_connection().map_err(StoreError::backend)?;
        info!("Connected to Redis cache at {}", url);

        Ok(Self {
            conn: Mutex::new(conn),
            prefix: DEFAULT_PREFIX.to_string(),
            ttl: TtlSetting::default(),
        })
    }

    /// Namespace keys with `prefix` instead of [`DEFAULT_PREFIX`]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Key prefix in use
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl CacheStore for RedisStore {
    fn has(&self, key: &str) -> Result<bool, StoreError> {
        redis::cmd("EXISTS")
            .arg(self.namespaced(key))
            .query(&mut *self.conn.lock())
            .map_err(StoreError::backend)
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let encoded: Option<String> = redis::cmd("GET")
            .arg(self.namespaced(key))
            .query(&mut *self.conn.lock())
            .map_err(StoreError::backend)?;

        match encoded {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(StoreError::backend)?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(self.namespaced(key)).arg(json);
        if let Some(secs) = self.ttl.expiring_secs() {
            cmd.arg("EX").arg(secs);
        }

        cmd.query::<()>(&mut *self.conn.lock())
            .map_err(StoreError::backend)
    }

    fn configure_ttl(&self, ttl: Duration) {
        self.ttl.set(ttl);
    }

    fn ttl(&self) -> Duration {
        self.ttl.get()
    }
}
