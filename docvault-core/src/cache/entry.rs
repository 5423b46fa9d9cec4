//! # Cache Entry
//!
//! 单个文档的缓存记录。

use std::cmp::Ordering;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

/// Upper bound used when `cached_at + ttl` overflows the clock.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// 缓存条目
///
/// Returned to callers as a snapshot: `payload` is an immutable,
/// reference-counted view, so the cache's own copy cannot be aliased mutably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    document_id: String,
    payload: Bytes,
    /// 写入时间
    cached_at: Instant,
    /// 过期时间 (`cached_at + ttl`)
    expires_at: Instant,
    /// 最后访问时间 (用于 LRU)
    last_accessed_at: Instant,
    /// 累计命中次数，仅用于观测
    hit_count: u64,
    /// Bumped on every write or access
    revision: u64,
}

impl CacheEntry {
    pub(crate) fn new(document_id: String, payload: Bytes, now: Instant, ttl: Duration) -> Self {
        Self {
            document_id,
            payload,
            cached_at: now,
            expires_at: expiry(now, ttl),
            last_accessed_at: now,
            hit_count: 0,
            revision: 0,
        }
    }

    /// 覆盖写入：重置时间戳，保留累计命中次数
    pub(crate) fn refresh(&mut self, payload: Bytes, now: Instant, ttl: Duration) {
        self.payload = payload;
        self.cached_at = now;
        self.expires_at = expiry(now, ttl);
        self.touch(now);
        self.revision = self.revision.wrapping_add(1);
    }

    /// 记录访问
    pub(crate) fn record_access(&mut self, now: Instant) {
        self.touch(now);
        self.hit_count += 1;
        self.revision = self.revision.wrapping_add(1);
    }

    fn touch(&mut self, now: Instant) {
        if now > self.last_accessed_at {
            self.last_accessed_at = now;
        }
    }

    /// Eviction order: oldest access first, then oldest write, then key.
    pub(crate) fn lru_cmp(&self, other: &CacheEntry) -> Ordering {
        self.last_accessed_at
            .cmp(&other.last_accessed_at)
            .then_with(|| self.cached_at.cmp(&other.cached_at))
            .then_with(|| self.document_id.cmp(&other.document_id))
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    pub fn cached_at(&self) -> Instant {
        self.cached_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn last_accessed_at(&self) -> Instant {
        self.last_accessed_at
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// 检查在 `now` 时刻是否仍然有效
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    /// 剩余有效期，已过期时为零
    pub fn remaining_ttl(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    /// 获取年龄 (写入时长)
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.cached_at)
    }
}

fn expiry(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(MAX_TTL))
        .unwrap_or(now)
}
