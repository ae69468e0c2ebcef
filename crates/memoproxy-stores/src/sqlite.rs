//! SqliteStore: embedded relational cache
//!
//! Table layout:
//! ```text
//! cache(key TEXT PRIMARY KEY, value TEXT NOT NULL, time INTEGER NOT NULL)
//! ```
//!
//! `value` holds the JSON encoding of the cached [`Value`], `time` the Unix
//! timestamp of the write. Expiry is decided when reading: a row is live while
//! `time > now - ttl`. Stale rows stay on disk until [`SqliteStore::purge_expired`]
//! is called.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use memoproxy::{CacheStore, StoreError, Value};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::ttl::TtlSetting;

const CREATE_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS cache (key TEXT PRIMARY KEY, value TEXT NOT NULL, time INTEGER NOT NULL)";
const SELECT_LIVE: &str = "SELECT value FROM cache WHERE key = ?1 AND time > ?2";
const EXISTS_LIVE: &str = "SELECT EXISTS(SELECT 1 FROM cache WHERE key = ?1 AND time > ?2)";
const UPSERT: &str = "INSERT OR REPLACE INTO cache (key, value, time) VALUES (?1, ?2, ?3)";
const DELETE_STALE: &str = "DELETE FROM cache WHERE time <= ?1";
const COUNT_ROWS: &str = "SELECT COUNT(*) FROM cache";

/// Cache store persisted in an SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
    ttl: TtlSetting,
}

impl SqliteStore {
    /// Open or create a database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(StoreError::backend)?;
        info!("SQLite cache opened at {:?}", path);
        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::backend)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(CREATE_TABLE, []).map_err(StoreError::backend)?;
        Ok(Self {
            conn: Mutex::new(conn),
            ttl: TtlSetting::default(),
        })
    }

    /// Delete rows that are no longer live, returning how many were removed
    ///
    /// Does nothing when the TTL is zero.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        self.purge_expired_at(Utc::now().timestamp())
    }

    /// Number of rows, live or stale
    pub fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row(COUNT_ROWS, [], |row| row.get(0))
            .map_err(StoreError::backend)?;
        Ok(count as usize)
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Oldest write time still considered live at `now`
    fn cutoff(&self, now: i64) -> i64 {
        match self.ttl.expiring_secs() {
            Some(secs) => now.saturating_sub(i64::try_from(secs).unwrap_or(i64::MAX)),
            None => i64::MIN,
        }
    }

    fn has_at(&self, key: &str, now: i64) -> Result<bool, StoreError> {
        self.conn
            .lock()
            .query_row(EXISTS_LIVE, params![key, self.cutoff(now)], |row| row.get(0))
            .map_err(StoreError::backend)
    }

    fn get_at(&self, key: &str, now: i64) -> Result<Option<Value>, StoreError> {
        let encoded: Option<String> = self
            .conn
            .lock()
            .query_row(SELECT_LIVE, params![key, self.cutoff(now)], |row| row.get(0))
            .optional()
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

    fn set_at(&self, key: &str, value: &Value, now: i64) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(StoreError::backend)?;
        self.conn
            .lock()
            .execute(UPSERT, params![key, json, now])
            .map_err(StoreError::backend)?;
        Ok(())
    }

    fn purge_expired_at(&self, now: i64) -> Result<usize, StoreError> {
        if self.ttl.expiring_secs().is_none() {
            return Ok(0);
        }
        let removed = self
            .conn
            .lock()
            .execute(DELETE_STALE, params![self.cutoff(now)])
            .map_err(StoreError::backend)?;
        debug!(removed, "purged stale cache rows");
        Ok(removed)
    }
}

impl CacheStore for SqliteStore {
    fn has(&self, key: &str) -> Result<bool, StoreError> {
        self.has_at(key, Utc::now().timestamp())
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.get_at(key, Utc::now().timestamp())
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.set_at(key, value, Utc::now().timestamp())
    }

    fn configure_ttl(&self, ttl: Duration) {
        self.ttl.set(ttl);
    }

    fn ttl(&self) -> Duration {
        self.ttl.get()
    }
}
