//! # memoproxy-stores
//!
//! Cache store backends for [`memoproxy`].
//!
//! ## Backends
//! - **MemoryStore**: unbounded map, never expires (tests, short-lived tools)
//! - **LocalStore**: bounded LRU with per-entry expiry, single process
//! - **SqliteStore**: embedded SQLite table, expiry filtered at read time
//! - **RedisStore**: shared Redis server, expiry enforced server-side
//!
//! Every backend starts with [`memoproxy::DEFAULT_TTL`] and treats a zero
//! TTL as "never expire".

#![warn(missing_docs)]

mod local;
mod lru;
mod memory;
mod redis_store;
mod sqlite;
mod stats;
mod ttl;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use redis_store::{RedisStore, DEFAULT_PREFIX};
pub use sqlite::SqliteStore;
pub use stats::CacheStats;
