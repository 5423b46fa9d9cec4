//! # Cache Metrics
//!
//! 缓存统计指标，全部为无锁原子计数器。

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// 缓存统计指标
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// 命中次数
    hits: AtomicU64,
    /// 未命中次数
    misses: AtomicU64,
    /// `get` 命中但条目已过期的次数
    stale_hits: AtomicU64,
    /// 容量淘汰次数
    evictions: AtomicU64,
    /// 过期清理次数
    expirations: AtomicU64,
    /// 失效次数
    invalidations: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_hit(&self) {
        self.record_hit();
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expirations(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// 请求总数 (`get` + `get_if_valid`)，即命中与未命中之和
    pub fn requests(&self) -> u64 {
        self.hits() + self.misses()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// 计算命中率 (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        ratio(hits, hits + self.misses())
    }

    /// 计算未命中率 (0.0 - 1.0)
    pub fn miss_rate(&self) -> f64 {
        let misses = self.misses();
        ratio(misses, self.hits() + misses)
    }

    /// 重置所有统计
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.stale_hits.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.expirations.store(0, Ordering::Relaxed);
        self.invalidations.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self, total_size: usize) -> CacheMetricsSnapshot {
        let hits = self.hits();
        let misses = self.misses();
        let requests = hits + misses;
        CacheMetricsSnapshot {
            hit_rate: ratio(hits, requests),
            miss_rate: ratio(misses, requests),
            eviction_count: self.evictions(),
            total_size,
            requests,
            hits,
            misses,
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64) / (total as f64)
}

/// 缓存统计快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheMetricsSnapshot {
    pub hit_rate: f64,
    pub miss_rate: f64,
    /// 仅统计容量淘汰，不含失效与清空
    pub eviction_count: u64,
    /// 当前条目数
    pub total_size: usize,
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub stale_hits: u64,
    pub expirations: u64,
    pub invalidations: u64,
}
