//! Fetch pipeline counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// 拉取统计
#[derive(Debug, Default)]
pub struct FetchStats {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    transport_attempts: AtomicU64,
    transport_failures: AtomicU64,
    retries: AtomicU64,
    circuit_rejections: AtomicU64,
    /// 以过期缓存应答的次数
    stale_fallbacks: AtomicU64,
    terminal_failures: AtomicU64,
    background_refreshes: AtomicU64,
}

macro_rules! counter {
    ($record:ident, $field:ident) => {
        pub fn $record(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl FetchStats {
    pub fn new() -> Self {
        Self::default()
    }

    counter!(record_request, requests);
    counter!(record_cache_hit, cache_hits);
    counter!(record_attempt, transport_attempts);
    counter!(record_transport_failure, transport_failures);
    counter!(record_retry, retries);
    counter!(record_circuit_rejection, circuit_rejections);
    counter!(record_stale_fallback, stale_fallbacks);
    counter!(record_terminal_failure, terminal_failures);
    counter!(record_background_refresh, background_refreshes);

    pub fn snapshot(&self) -> FetchStatsSnapshot {
        FetchStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            transport_attempts: self.transport_attempts.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            circuit_rejections: self.circuit_rejections.load(Ordering::Relaxed),
            stale_fallbacks: self.stale_fallbacks.load(Ordering::Relaxed),
            terminal_failures: self.terminal_failures.load(Ordering::Relaxed),
            background_refreshes: self.background_refreshes.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchStatsSnapshot {
    pub requests: u64,
    pub cache_hits: u64,
    pub transport_attempts: u64,
    pub transport_failures: u64,
    pub retries: u64,
    pub circuit_rejections: u64,
    pub stale_fallbacks: u64,
    pub terminal_failures: u64,
    pub background_refreshes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = FetchStats::new();
        stats.record_request();
        stats.record_attempt();
        stats.record_attempt();
        stats.record_stale_fallback();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, 1);
        assert_eq!(snapshot.transport_attempts, 2);
        assert_eq!(snapshot.stale_fallbacks, 1);
        assert_eq!(snapshot.cache_hits, 0);
    }
}
