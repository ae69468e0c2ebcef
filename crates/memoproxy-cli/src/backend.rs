//! Backend selection from command-line arguments

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use memoproxy::CacheStore;
use memoproxy_stores::{LocalStore, MemoryStore, RedisStore, SqliteStore};

/// Cache backend kinds the demo can run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Unbounded in-process map
    Memory,
    /// Bounded in-process LRU with expiry
    Local,
    /// SQLite database file
    Sqlite,
    /// Redis server
    Redis,
}

/// Settings needed to open any backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub capacity: usize,
    pub sqlite_path: PathBuf,
    pub redis_url: String,
}

impl BackendConfig {
    /// Open the configured backend
    pub fn open(&self) -> Result<Arc<dyn CacheStore>> {
        let store: Arc<dyn CacheStore> = match self.kind {
            BackendKind::Memory => Arc::new(MemoryStore::new()),
            BackendKind::Local => {
                anyhow::ensure!(self.capacity > 0, "Local cache capacity must be greater than 0");
                Arc::new(LocalStore::new(self.capacity))
            }
            BackendKind::Sqlite => Arc::new(
                SqliteStore::open(&self.sqlite_path)
                    .with_context(|| format!("Failed to open SQLite cache {:?}", self.sqlite_path))?,
            ),
            BackendKind::Redis => Arc::new(
                RedisStore::connect(&self.redis_url)
                    .with_context(|| format!("Failed to connect to Redis at {}", self.redis_url))?,
            ),
        };
        Ok(store)
    }
}
