use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use memoproxy::{Args, CacheStore, CallDescriptor, Error, MethodTable, Proxy, Value};
use memoproxy_stores::{LocalStore, MemoryStore, SqliteStore};
use tempfile::TempDir;

struct MockSubject {
    calls: AtomicUsize,
}

fn mock_subject() -> Arc<MethodTable<MockSubject>> {
    let subject = MethodTable::named(
        "MockSubject",
        MockSubject {
            calls: AtomicUsize::new(0),
        },
    )
    .method("mock_call", |s, args| {
        s.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Value::from(format!(
            "Hello from MockSubject with a value arg of {}",
            args.int(0)?
        )))
    });
    Arc::new(subject)
}

fn calls(subject: &MethodTable<MockSubject>) -> usize {
    subject.subject().calls.load(Ordering::SeqCst)
}

/// Runs the memoization scenario against any backend
fn exercise(store: Arc<dyn CacheStore>) {
    let subject = mock_subject();
    let mut proxy = Proxy::new();
    proxy.attach_store(store.clone());
    proxy.attach_subject(subject.clone()).unwrap();

    let first = proxy.call("mock_call", &[Value::Int(42)]).unwrap();
    let second = proxy.call("mock_call", &[Value::Int(42)]).unwrap();

    assert_eq!(first, second);
    assert_eq!(calls(&subject), 1);

    let fp = proxy
        .fingerprint("MockSubject", "mock_call", &[Value::Int(42)])
        .unwrap();
    let cached = store.get(fp.as_str()).unwrap().unwrap();
    assert!(cached.as_str().unwrap().contains("42"));

    let call = CallDescriptor::new("MockSubject", "mock_call", vec![Value::Int(42)]);
    assert_eq!(proxy.hit_count_for(&call).unwrap(), 1);

    proxy.call("mock_call", &[Value::Int(43)]).unwrap();
    let other = CallDescriptor::new("MockSubject", "mock_call", vec![Value::Int(43)]);
    assert_eq!(proxy.hit_count_for(&other).unwrap(), 0);
    assert_eq!(calls(&subject), 2);
}

#[test]
fn test_memory_store_with_real_proxy() {
    let store = Arc::new(MemoryStore::new());
    exercise(store.clone());

    // One proxy hit plus the direct read in `exercise`
    assert_eq!(store.len(), 2);
    assert_eq!(store.stats().hits(), 2);
    assert_eq!(store.stats().misses(), 2);
}

#[test]
fn test_local_store_with_real_proxy() {
    let store = Arc::new(LocalStore::new(16));
    exercise(store.clone());

    assert_eq!(store.len(), 2);
    assert_eq!(store.stats().sets(), 2);
}

#[test]
fn test_sqlite_store_with_real_proxy() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    exercise(store);
}

#[test]
fn test_ttl_propagates_to_every_backend() {
    let stores: Vec<Arc<dyn CacheStore>> = vec![
        Arc::new(MemoryStore::new()),
        Arc::new(LocalStore::new(4)),
        Arc::new(SqliteStore::open_in_memory().unwrap()),
    ];

    for store in stores {
        let mut proxy = Proxy::new();
        proxy.attach_store_with_ttl(store.clone(), Duration::from_secs(20));
        assert_eq!(store.ttl(), Duration::from_secs(20));
    }
}

#[test]
fn test_memory_store_records_binding_ttl() {
    let store = Arc::new(MemoryStore::new());
    let mut proxy = Proxy::new();
    proxy.attach_store_with_ttl(store.clone(), Duration::from_secs(20));
    proxy.attach_subject(mock_subject()).unwrap();

    proxy.call("mock_call", &[Value::Int(1)]).unwrap();
    let fp = proxy
        .fingerprint("MockSubject", "mock_call", &[Value::Int(1)])
        .unwrap();

    assert_eq!(store.entry_ttl(fp.as_str()), Some(Duration::from_secs(20)));
}

#[test]
fn test_restart_loses_hit_history() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("proxy.sq3");

    {
        let mut proxy = Proxy::new();
        proxy.attach_store(Arc::new(SqliteStore::open(&path).unwrap()));
        proxy.attach_subject(mock_subject()).unwrap();
        proxy.call("mock_call", &[Value::Int(7)]).unwrap();
    }

    // A fresh proxy finds the persisted entry but has no hit count for it
    let subject = mock_subject();
    let mut proxy = Proxy::new();
    proxy.attach_store(Arc::new(SqliteStore::open(&path).unwrap()));
    proxy.attach_subject(subject.clone()).unwrap();

    let err = proxy.call("mock_call", &[Value::Int(7)]).unwrap_err();
    assert!(matches!(err, Error::UnknownFingerprint(_)));
    assert_eq!(calls(&subject), 0);
}

#[test]
fn test_shared_store_between_proxies() {
    let store = Arc::new(LocalStore::new(16));

    let first_subject = mock_subject();
    let mut first = Proxy::new();
    first.attach_store(store.clone());
    first.attach_subject(first_subject.clone()).unwrap();

    let second_subject = mock_subject();
    let mut second = Proxy::new();
    second.attach_store(store.clone());
    second.attach_subject(second_subject.clone()).unwrap();

    first.call("mock_call", &[Value::Int(5)]).unwrap();
    second.call("mock_call", &[Value::Int(6)]).unwrap();

    assert_eq!(calls(&first_subject), 1);
    assert_eq!(calls(&second_subject), 1);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_warm_proxy_serves_repeated_rounds() {
    let stores: Vec<Arc<dyn CacheStore>> = vec![
        Arc::new(MemoryStore::new()),
        Arc::new(LocalStore::new(1000)),
        Arc::new(SqliteStore::open_in_memory().unwrap()),
    ];

    for store in stores {
        let subject = mock_subject();
        let mut proxy = Proxy::new();
        proxy.attach_store(store);
        proxy.attach_subject(subject.clone()).unwrap();

        for i in 0..100 {
            proxy.call("mock_call", &[Value::Int(i)]).unwrap();
        }
        for round in 0..300 {
            proxy.call("mock_call", &[Value::Int(round % 100)]).unwrap();
        }

        assert_eq!(calls(&subject), 100);
        let call = CallDescriptor::new("MockSubject", "mock_call", vec![Value::Int(0)]);
        assert_eq!(proxy.hit_count_for(&call).unwrap(), 3);
    }
}
