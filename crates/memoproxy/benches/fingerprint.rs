use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use memoproxy::fingerprint::fingerprint;
use memoproxy::{Sha256Hex, ShortSha256, Value};

fn bench_small_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint_small");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    let args = vec![Value::Int(42), Value::from("foobar")];

    group.bench_function("sha256_128", |b| {
        b.iter(|| {
            black_box(fingerprint(&ShortSha256, "MockSubject", "mock_call", &args).unwrap());
        });
    });

    group.bench_function("sha256", |b| {
        b.iter(|| {
            black_box(fingerprint(&Sha256Hex, "MockSubject", "mock_call", &args).unwrap());
        });
    });

    group.finish();
}

fn bench_large_args(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint_large");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("1kb_bytes_arg", |b| {
        let args = vec![Value::Bytes(vec![b'x'; 1024])];

        b.iter(|| {
            black_box(fingerprint(&ShortSha256, "MockSubject", "mock_call", &args).unwrap());
        });
    });

    group.bench_function("100_int_list", |b| {
        let args = vec![Value::List((0..100).map(Value::Int).collect())];

        b.iter(|| {
            black_box(fingerprint(&ShortSha256, "MockSubject", "mock_call", &args).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_small_call, bench_large_args);
criterion_main!(benches);
