//! Proxy: memoizing dispatch in front of a subject

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::consistency::{assert_no_collision, PROXY_OPERATIONS};
use crate::error::{BoxError, Error, Result, StoreError, SubjectPanic};
use crate::fingerprint::{self, CallDescriptor, Fingerprint, HashFunction, ShortSha256};
use crate::hits::HitTracker;
use crate::store::{CacheStore, DEFAULT_TTL};
use crate::subject::Invokable;
use crate::value::Value;

/// Memoizing proxy around one subject and one cache store
///
/// Every [`call`](Proxy::call) is fingerprinted from the subject's type name,
/// the method name and the arguments. Known fingerprints are served from the
/// store; unknown ones are forwarded to the subject and the result is stored.
///
/// Configuration takes `&mut self`, calls take `&self`, so a configured proxy
/// can be shared behind an `Arc`. Calls are serialized: the lookup, the subject
/// call and the store write happen under one lock. A subject must therefore
/// not call back into the proxy that wraps it.
pub struct Proxy {
    subject: Option<Arc<dyn Invokable>>,
    store: Option<Arc<dyn CacheStore>>,
    hasher: Arc<dyn HashFunction>,
    hits: HitTracker,
    reserved: OnceCell<HashSet<&'static str>>,
    dispatch: Mutex<()>,
}

impl Proxy {
    /// Create an unconfigured proxy using the default hash function
    pub fn new() -> Self {
        Self {
            subject: None,
            store: None,
            hasher: Arc::new(ShortSha256),
            hits: HitTracker::new(),
            reserved: OnceCell::new(),
            dispatch: Mutex::new(()),
        }
    }

    /// Attach the subject to cache calls from
    ///
    /// Rejected with [`Error::AmbiguousDispatch`] if the subject exposes an
    /// operation named like one of the proxy's own; the previously attached
    /// subject, if any, stays in place.
    pub fn attach_subject(&mut self, subject: Arc<dyn Invokable>) -> Result<&mut Self> {
        if let Err(err) = assert_no_collision(self.reserved(), subject.methods()) {
            warn!(type_name = subject.type_name(), "subject rejected: {}", err);
            return Err(err);
        }

        debug!(type_name = subject.type_name(), "subject attached");
        self.subject = Some(subject);
        Ok(self)
    }

    /// Attach the cache store with the default TTL
    pub fn attach_store(&mut self, store: Arc<dyn CacheStore>) -> &mut Self {
        self.attach_store_with_ttl(store, DEFAULT_TTL)
    }

    /// Attach the cache store and configure its TTL
    pub fn attach_store_with_ttl(&mut self, store: Arc<dyn CacheStore>, ttl: Duration) -> &mut Self {
        store.configure_ttl(ttl);
        debug!(ttl = ?ttl, "cache store attached");
        self.store = Some(store);
        self
    }

    /// The attached cache store
    pub fn store(&self) -> Option<&Arc<dyn CacheStore>> {
        self.store.as_ref()
    }

    /// Fingerprint of a call with the current hash function
    pub fn fingerprint(&self, type_name: &str, method: &str, args: &[Value]) -> Result<Fingerprint> {
        let fp = fingerprint::fingerprint(self.hasher.as_ref(), type_name, method, args)?;
        trace!(type_name, method, %fp, "fingerprint computed");
        Ok(fp)
    }

    /// Fingerprint of a described call with the current hash function
    pub fn fingerprint_call(&self, call: &CallDescriptor) -> Result<Fingerprint> {
        self.fingerprint(&call.type_name, &call.method, &call.args)
    }

    /// Replace the hash function
    ///
    /// Entries stored under the previous function are not migrated and can no
    /// longer be reached through this proxy.
    pub fn set_hash_function(&mut self, hasher: Arc<dyn HashFunction>) -> &mut Self {
        debug!(from = self.hasher.name(), to = hasher.name(), "hash function replaced");
        self.hasher = hasher;
        self
    }

    /// The hash function in use
    pub fn hash_function(&self) -> &Arc<dyn HashFunction> {
        &self.hasher
    }

    /// Times the result for `fingerprint` was served from cache
    pub fn hit_count(&self, fingerprint: &str) -> Result<u64> {
        self.hits.get(fingerprint)
    }

    /// Times the result for `call` was served from cache
    pub fn hit_count_for(&self, call: &CallDescriptor) -> Result<u64> {
        let fp = self.fingerprint_call(call)?;
        self.hits.get(fp.as_str())
    }

    /// Call `method` on the subject, memoized through the cache store
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        let (subject, store) = match (&self.subject, &self.store) {
            (Some(subject), Some(store)) => (subject, store),
            (subject, store) => {
                return Err(Error::NotConfigured {
                    subject: subject.is_none(),
                    store: store.is_none(),
                })
            }
        };

        let type_name = subject.type_name();
        let fp = self.fingerprint(type_name, method, args)?;

        let _guard = self.dispatch.lock();

        if store.has(fp.as_str())? {
            let hits = self.hits.record_hit(&fp)?;
            debug!(type_name, method, %fp, hits, "cache hit");
            return match store.get(fp.as_str())? {
                Some(value) => Ok(value),
                None => Err(StoreError::Vanished(fp.into_string()).into()),
            };
        }

        if !subject.responds_to(method) {
            return Err(Error::UnknownMethod {
                type_name: type_name.to_string(),
                method: method.to_string(),
            });
        }

        debug!(type_name, method, %fp, "cache miss");
        let value = invoke_subject(subject.as_ref(), method, args)?;

        store.set(fp.as_str(), &value)?;
        self.hits.start(fp);

        Ok(value)
    }

    fn reserved(&self) -> &HashSet<&'static str> {
        self.reserved
            .get_or_init(|| PROXY_OPERATIONS.iter().copied().collect())
    }
}

impl Default for Proxy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("subject", &self.subject.as_ref().map(|s| s.type_name().to_string()))
            .field("store", &self.store.is_some())
            .field("hash_function", &self.hasher.name())
            .field("tracked", &self.hits.len())
            .finish()
    }
}

fn invoke_subject(subject: &dyn Invokable, method: &str, args: &[Value]) -> Result<Value> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| subject.invoke(method, args)));

    let source: BoxError = match outcome {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(err)) => err,
        Err(payload) => Box::new(SubjectPanic {
            message: panic_message(payload.as_ref()),
        }),
    };

    warn!(type_name = subject.type_name(), method, "subject call failed: {}", source);
    Err(Error::SubjectInvocationFailed {
        type_name: subject.type_name().to_string(),
        method: method.to_string(),
        source,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
