//! memoproxy demo: a slow subject memoized through a chosen cache backend

mod backend;
mod subject;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use memoproxy::{CallDescriptor, Invokable, Proxy, Value};
use tracing::{info, warn};

use crate::backend::{BackendConfig, BackendKind};
use crate::subject::example_subject;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Cache backend
    #[arg(short, long, value_enum, default_value_t = BackendKind::Memory)]
    backend: BackendKind,

    /// Entry TTL in seconds (0 = never expire)
    #[arg(short, long, default_value_t = 120)]
    ttl: u64,

    /// Capacity of the local backend (number of entries)
    #[arg(short, long, default_value_t = 10000)]
    capacity: usize,

    /// SQLite database file
    #[arg(long, default_value = "/tmp/memoproxy.sq3")]
    sqlite: PathBuf,

    /// Redis URL
    #[arg(long, default_value = "redis://127.0.0.1:6379")]
    redis: String,

    /// Delay of the slow operation in milliseconds
    #[arg(long, default_value_t = 3000)]
    delay_ms: i64,

    /// How many times each call is repeated
    #[arg(long, default_value_t = 2)]
    repeat: usize,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting memoproxy demo v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {:?}", cli.backend);
    info!("TTL: {}s", cli.ttl);

    let backend = BackendConfig {
        kind: cli.backend,
        capacity: cli.capacity,
        sqlite_path: cli.sqlite.clone(),
        redis_url: cli.redis.clone(),
    };
    let store = backend.open()?;

    let subject = Arc::new(example_subject());
    let mut proxy = Proxy::new();
    proxy.attach_store_with_ttl(store, Duration::from_secs(cli.ttl));
    proxy
        .attach_subject(subject.clone())
        .context("Failed to attach subject")?;

    let calls = [
        ("im_heavy", vec![Value::Int(cli.delay_ms)]),
        ("fib", vec![Value::Int(90)]),
    ];

    println!("{}", "-".repeat(10));
    for (method, args) in &calls {
        for _ in 0..cli.repeat {
            run_call(&proxy, subject.as_ref(), method, args)?;
        }
    }

    Ok(())
}

fn run_call(proxy: &Proxy, subject: &dyn Invokable, method: &str, args: &[Value]) -> Result<()> {
    let started = Instant::now();
    let result = match proxy.call(method, args) {
        Ok(value) => value,
        Err(memoproxy::Error::UnknownFingerprint(fp)) => {
            // Persistent backends outlive the hit counts of earlier runs
            warn!(%fp, "entry cached by a previous run; restart with a fresh cache to track hits");
            return Ok(());
        }
        Err(err) => return Err(err).with_context(|| format!("Call to {} failed", method)),
    };
    let elapsed = started.elapsed();

    let call = CallDescriptor::on(subject, method, args.to_vec());
    let hits = proxy.hit_count_for(&call)?;

    println!(
        "{}({}) = {}  [{:.1?}, cache hits: {}]",
        method,
        args.iter().map(Value::to_string).collect::<Vec<_>>().join(", "),
        result,
        elapsed,
        hits
    );

    Ok(())
}
