//! Cache Performance Benchmarks
//!
//! - get / get_if_valid hit path
//! - put of new keys with LRU eviction at capacity
//! - fetch served from cache

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::runtime::Runtime;

use docvault_core::{
    CachePolicy, CircuitBreakerConfig, FetchCache, ResilientFetcher, RetryPolicy, Transport,
    TransportError,
};

const PAYLOAD: &[u8] = &[0u8; 1024];

fn filled_cache(capacity: usize) -> FetchCache {
    let policy = CachePolicy::new(capacity, Duration::from_secs(3600), Duration::ZERO).unwrap();
    let cache = FetchCache::new(policy);
    cache.warm_up((0..capacity).map(|i| (format!("doc-{}", i), PAYLOAD)));
    cache
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_get");
    group.throughput(Throughput::Elements(1));

    for size in [100usize, 1_000, 10_000].iter() {
        let cache = filled_cache(*size);
        group.bench_with_input(BenchmarkId::new("get_if_valid", size), size, |b, &size| {
            let mut i = 0usize;
            b.iter(|| {
                i = (i + 1) % size;
                black_box(cache.get_if_valid(&format!("doc-{}", i)))
            });
        });
        group.bench_with_input(BenchmarkId::new("peek", size), size, |b, &size| {
            let mut i = 0usize;
            b.iter(|| {
                i = (i + 1) % size;
                black_box(cache.peek(&format!("doc-{}", i)))
            });
        });
    }
    group.finish();
}

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_put");
    group.throughput(Throughput::Elements(1));

    for size in [100usize, 1_000].iter() {
        group.bench_with_input(BenchmarkId::new("overwrite", size), size, |b, &size| {
            let cache = filled_cache(size);
            let mut i = 0usize;
            b.iter(|| {
                i = (i + 1) % size;
                cache.put(&format!("doc-{}", i), Bytes::from_static(PAYLOAD), None);
            });
        });

        // 每次插入新键都会触发一次淘汰
        group.bench_with_input(BenchmarkId::new("evicting_insert", size), size, |b, &size| {
            let cache = filled_cache(size);
            let mut i = size;
            b.iter(|| {
                i += 1;
                cache.put(&format!("doc-{}", i), Bytes::from_static(PAYLOAD), None);
            });
        });
    }
    group.finish();
}

struct StaticTransport;

#[async_trait]
impl Transport for StaticTransport {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_bytes(&self, _document_id: &str) -> Result<Bytes, TransportError> {
        Ok(Bytes::from_static(PAYLOAD))
    }
}

fn bench_fetch_hit(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let cache = Arc::new(filled_cache(1_000));
    let fetcher = ResilientFetcher::new(
        Arc::new(StaticTransport),
        cache,
        RetryPolicy::default(),
        CircuitBreakerConfig::default(),
    );

    c.bench_function("fetch_cache_hit", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % 1_000;
            let id = format!("doc-{}", i);
            black_box(rt.block_on(fetcher.fetch(&id)).unwrap())
        });
    });
}

criterion_group!(benches, bench_get, bench_put, bench_fetch_hit);
criterion_main!(benches);
