//! End-to-end behaviour of cache + retry + breaker + fallback.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio_test::{assert_err, assert_ok};

use crate::cache::{CachePolicy, FetchCache};
use crate::error::FetchFailure;
use crate::resilience::{CircuitBreakerConfig, CircuitState, ResilientFetcher, RetryPolicy};
use crate::test_utils::{Outcome, ScriptedTransport};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn build(
    transport: &Arc<ScriptedTransport>,
    policy: CachePolicy,
    retry: RetryPolicy,
    breaker: CircuitBreakerConfig,
) -> ResilientFetcher {
    ResilientFetcher::new(transport.clone(), Arc::new(FetchCache::new(policy)), retry, breaker)
}

fn small_cache() -> CachePolicy {
    CachePolicy::new(4, secs(60), Duration::ZERO).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_valid_entry_never_reaches_transport() {
    let transport = Arc::new(ScriptedTransport::always_failing());
    let fetcher = build(
        &transport,
        small_cache(),
        RetryPolicy::default(),
        CircuitBreakerConfig::default(),
    );
    fetcher.cache().put("doc-1", &b"cached"[..], None);

    for _ in 0..10 {
        let payload = assert_ok!(fetcher.fetch("doc-1").await);
        assert_eq!(payload, Bytes::from_static(b"cached"));
    }
    assert_eq!(transport.calls(), 0);
    assert_eq!(fetcher.stats().cache_hits, 10);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_delays_between_attempts() {
    let transport = Arc::new(ScriptedTransport::always_failing());
    let retry = RetryPolicy::new(5, secs(1), secs(10), 2.0).unwrap();
    let breaker = CircuitBreakerConfig::new(100, secs(30), 1).unwrap();
    let fetcher = build(&transport, small_cache(), retry, breaker);

    assert_err!(fetcher.fetch("doc-1").await);

    assert_eq!(transport.calls(), 6);
    assert_eq!(transport.call_gaps(), vec![secs(1), secs(2), secs(4), secs(8), secs(10)]);
    assert_eq!(fetcher.stats().retries, 5);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_opens_fails_fast_and_recovers() {
    let transport = Arc::new(
        ScriptedTransport::new(
            std::iter::repeat_with(Outcome::transient).take(5),
            Outcome::ok(&b"fresh"[..]),
        )
        .with_latency(secs(1)),
    );
    let breaker = CircuitBreakerConfig::new(5, secs(30), 1).unwrap();
    let fetcher = Arc::new(build(&transport, small_cache(), RetryPolicy::no_retry(), breaker));

    for i in 0..5 {
        assert_err!(fetcher.fetch(&format!("doc-{i}")).await);
    }
    assert_eq!(transport.calls(), 5);
    assert_eq!(fetcher.breaker().state(), CircuitState::Open);

    // OPEN 期间快速失败
    for _ in 0..3 {
        let err = fetcher.fetch("doc-x").await.unwrap_err();
        assert!(matches!(err.fetch_failure(), Some(FetchFailure::CircuitOpen { .. })));
    }
    assert_eq!(transport.calls(), 5);

    tokio::time::advance(secs(30)).await;

    let trial = {
        let fetcher = fetcher.clone();
        tokio::spawn(async move { fetcher.fetch("doc-x").await })
    };
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(fetcher.breaker().state(), CircuitState::HalfOpen);

    let payload = assert_ok!(trial.await.unwrap());
    assert_eq!(payload, Bytes::from_static(b"fresh"));
    assert_eq!(fetcher.breaker().state(), CircuitState::Closed);
    assert_eq!(fetcher.breaker().consecutive_failures(), 0);
    assert_eq!(transport.calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_served_when_offline() {
    let transport = Arc::new(ScriptedTransport::always_failing());
    let fetcher = build(
        &transport,
        small_cache(),
        RetryPolicy::new(2, Duration::from_millis(100), secs(1), 2.0).unwrap(),
        CircuitBreakerConfig::default(),
    );
    fetcher.cache().put("doc-1", &b"stale"[..], Some(secs(5)));
    tokio::time::advance(secs(6)).await;
    assert!(fetcher.cache().get_if_valid("doc-1").is_none());

    let payload = assert_ok!(fetcher.fetch("doc-1").await);
    assert_eq!(payload, Bytes::from_static(b"stale"));
    assert_eq!(transport.calls(), 3);

    let stats = fetcher.stats();
    assert_eq!(stats.stale_fallbacks, 1);
    assert_eq!(stats.terminal_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_cached_is_network_unavailable() {
    let transport = Arc::new(ScriptedTransport::always_failing());
    let fetcher = build(
        &transport,
        small_cache(),
        RetryPolicy::new(1, Duration::from_millis(100), secs(1), 2.0).unwrap(),
        CircuitBreakerConfig::default(),
    );

    let err = assert_err!(fetcher.fetch("doc-1").await);
    assert!(err.is_network_unavailable());
    assert!(matches!(err.fetch_failure(), Some(FetchFailure::Transport(e)) if e.is_transient()));
    assert_eq!(fetcher.stats().terminal_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_metrics_track_cache_outcomes() {
    let transport = Arc::new(ScriptedTransport::always_ok(&b"doc"[..]));
    let policy = CachePolicy::new(2, secs(60), Duration::ZERO).unwrap();
    let fetcher = build(
        &transport,
        policy,
        RetryPolicy::no_retry(),
        CircuitBreakerConfig::default(),
    );

    // miss, hit, miss, hit, miss (evicts "a")
    for id in ["a", "a", "b", "b", "c"] {
        assert_ok!(fetcher.fetch(id).await);
    }
    fetcher.invalidate("b");

    let metrics = fetcher.metrics();
    assert_eq!(metrics.requests, 5);
    assert_eq!(metrics.hits, 2);
    assert!((metrics.hit_rate - 0.4).abs() < f64::EPSILON);
    assert_eq!(metrics.eviction_count, 1);
    assert_eq!(metrics.invalidations, 1);
    assert_eq!(metrics.total_size, 1);
    assert!(fetcher.peek("a").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_success_after_failures_refreshes_cache() {
    let transport = Arc::new(ScriptedTransport::new(
        [Outcome::ok(&b"v1"[..]), Outcome::transient()],
        Outcome::ok(&b"v2"[..]),
    ));
    let policy = CachePolicy::new(4, secs(10), Duration::ZERO).unwrap();
    let fetcher = build(
        &transport,
        policy,
        RetryPolicy::new(1, Duration::from_millis(100), secs(1), 2.0).unwrap(),
        CircuitBreakerConfig::default(),
    );

    assert_eq!(assert_ok!(fetcher.fetch("doc").await), Bytes::from_static(b"v1"));
    tokio::time::advance(secs(11)).await;
    assert_eq!(assert_ok!(fetcher.fetch("doc").await), Bytes::from_static(b"v2"));

    let entry = fetcher.peek("doc").unwrap();
    assert!(entry.is_valid_at(fetcher.cache().now()));
    assert_eq!(transport.requested_ids(), vec!["doc", "doc", "doc"]);
}
