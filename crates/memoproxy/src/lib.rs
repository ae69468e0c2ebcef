//! # memoproxy
//!
//! Transparent memoizing proxy over pluggable cache stores.
//!
//! ## Architecture
//! - **Subject**: any type exposed through [`Invokable`], callable by name
//! - **Fingerprint**: hash of `(type name, method, args)`, see [`fingerprint`]
//! - **CacheStore**: get/set/has/TTL backend contract
//! - **Proxy**: serves known fingerprints from the store, forwards the rest
//!   and counts cache hits per fingerprint
//!
//! ```
//! use std::sync::Arc;
//! use memoproxy::{Args, MethodTable, Proxy, Value};
//! # use memoproxy::{CacheStore, StoreError};
//! # use parking_lot::Mutex;
//! # use std::collections::HashMap;
//! # use std::time::Duration;
//! # #[derive(Default)]
//! # struct MapStore(Mutex<HashMap<String, Value>>);
//! # impl CacheStore for MapStore {
//! #     fn has(&self, key: &str) -> Result<bool, StoreError> { Ok(self.0.lock().contains_key(key)) }
//! #     fn get(&self, key: &str) -> Result<Option<Value>, StoreError> { Ok(self.0.lock().get(key).cloned()) }
//! #     fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
//! #         self.0.lock().insert(key.to_string(), value.clone());
//! #         Ok(())
//! #     }
//! #     fn configure_ttl(&self, _ttl: Duration) {}
//! #     fn ttl(&self) -> Duration { Duration::ZERO }
//! # }
//!
//! struct Squarer;
//!
//! let subject = MethodTable::new(Squarer)
//!     .method("square", |_, args| Ok(Value::Int(args.int(0)?.pow(2))));
//!
//! let mut proxy = Proxy::new();
//! proxy.attach_store(Arc::new(MapStore::default()));
//! proxy.attach_subject(Arc::new(subject))?;
//!
//! assert_eq!(proxy.call("square", &[Value::Int(4)])?, Value::Int(16));
//! // Served from cache
//! assert_eq!(proxy.call("square", &[Value::Int(4)])?, Value::Int(16));
//! # Ok::<(), memoproxy::Error>(())
//! ```

#![warn(missing_docs)]

pub mod consistency;
mod error;
pub mod fingerprint;
mod hits;
mod proxy;
mod store;
mod subject;
mod value;

pub use error::{ArgumentError, BoxError, Error, Result, StoreError, SubjectPanic};
pub use fingerprint::{CallDescriptor, Fingerprint, HashFunction, Sha256Hex, ShortSha256};
pub use hits::HitTracker;
pub use proxy::Proxy;
pub use store::{CacheStore, DEFAULT_TTL};
pub use subject::{Invokable, MethodTable};
pub use value::{Args, Value};
