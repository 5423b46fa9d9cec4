//! # Fetch Cache
//!
//! 线程安全的文档缓存，TTL 过期 + LRU 淘汰。
//!
//! ## 特性
//!
//! - 分片哈希表 (`DashMap`)，读写只锁住单个分片
//! - "存在" 与 "有效" 分离：过期条目不会被自动删除，
//!   `get` 仍可返回，作为离线回退的数据来源
//! - 新键插入与淘汰在准入锁 (admission lock) 下串行执行，
//!   保证条目数不超过容量、同一条目不会被重复淘汰
//! - 覆盖已存在的键走快速路径，不经过准入锁
//!
//! ## 复杂度
//!
//! - `get` / `get_if_valid` / 覆盖写: O(1)
//! - 满容量插入新键: O(n) 扫描选出 LRU 条目
//!
//! ## 示例
//!
//! ```rust
//! use docvault_core::cache::{CachePolicy, FetchCache};
//! use std::time::Duration;
//!
//! let policy = CachePolicy::new(1000, Duration::from_secs(300), Duration::ZERO)?;
//! let cache = FetchCache::new(policy);
//!
//! cache.put("doc-1", b"bytes".to_vec(), None);
//! if let Some(entry) = cache.get_if_valid("doc-1") {
//!     assert_eq!(entry.payload().as_ref(), b"bytes");
//! }
//!
//! let metrics = cache.metrics();
//! println!("Hit rate: {:.2}%", metrics.hit_rate * 100.0);
//! # Ok::<(), docvault_core::error::DocVaultError>(())
//! ```

use std::time::Duration;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::clock::{system_clock, Clock, SharedClock};

use super::config::CachePolicy;
use super::entry::CacheEntry;
use super::metrics::{CacheMetrics, CacheMetricsSnapshot};

/// 文档缓存
#[derive(Debug)]
pub struct FetchCache {
    /// 缓存策略
    policy: CachePolicy,
    /// 主存储
    entries: DashMap<String, CacheEntry>,
    /// 准入锁：新键插入、淘汰、清空
    admission: Mutex<()>,
    /// 缓存统计
    metrics: CacheMetrics,
    clock: SharedClock,
}

impl FetchCache {
    /// 使用系统单调时钟创建缓存
    pub fn new(policy: CachePolicy) -> Self {
        Self::with_clock(policy, system_clock())
    }

    pub fn with_clock(policy: CachePolicy, clock: SharedClock) -> Self {
        Self {
            entries: DashMap::with_capacity(policy.capacity()),
            policy,
            admission: Mutex::new(()),
            metrics: CacheMetrics::new(),
            clock,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// 获取缓存条目，不论是否过期
    ///
    /// 命中时更新最后访问时间与命中次数。
    pub fn get(&self, document_id: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        match self.entries.get_mut(document_id) {
            Some(mut entry) => {
                entry.record_access(now);
                if entry.is_valid_at(now) {
                    self.metrics.record_hit();
                } else {
                    self.metrics.record_stale_hit();
                }
                Some(entry.value().clone())
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// 仅返回未过期的条目
    ///
    /// 过期条目视为未命中，但不会被删除。
    pub fn get_if_valid(&self, document_id: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        match self.entries.get_mut(document_id) {
            Some(mut entry) if entry.is_valid_at(now) => {
                entry.record_access(now);
                self.metrics.record_hit();
                debug!(document_id, "cache hit");
                Some(entry.value().clone())
            }
            _ => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// 只读查看，不更新访问时间与统计
    pub fn peek(&self, document_id: &str) -> Option<CacheEntry> {
        self.entries
            .get(document_id)
            .map(|entry| entry.value().clone())
    }

    /// 添加或更新缓存
    ///
    /// 新键且缓存已满时，先淘汰最久未访问的条目。
    ///
    /// # 参数
    /// - `document_id`: 文档 ID
    /// - `payload`: 文档内容
    /// - `ttl`: 可选的 TTL，默认使用策略中的 `default_ttl`
    pub fn put(&self, document_id: &str, payload: impl Into<Bytes>, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.policy.default_ttl());
        let payload = payload.into();

        if let Some(mut entry) = self.entries.get_mut(document_id) {
            entry.refresh(payload, self.clock.now(), ttl);
            return;
        }

        let _admission = self.admission.lock();

        if self.entries.len() >= self.policy.capacity() && !self.entries.contains_key(document_id) {
            self.evict_lru();
        }

        let now = self.clock.now();
        match self.entries.entry(document_id.to_string()) {
            Entry::Occupied(mut occupied) => occupied.get_mut().refresh(payload, now, ttl),
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::new(document_id.to_string(), payload, now, ttl));
            }
        }
    }

    /// 淘汰一个 LRU 条目，调用方须持有准入锁
    ///
    /// 覆盖写与读取不经过准入锁；候选条目在选出后被改动时重新选择。
    fn evict_lru(&self) {
        while self.entries.len() >= self.policy.capacity() {
            let (key, revision) = match self.lru_candidate() {
                Some(candidate) => candidate,
                None => return,
            };

            if self.remove_if_unchanged(&key, revision) {
                self.metrics.record_eviction();
                debug!(document_id = %key, "cache evicted");
                return;
            }
            debug!(document_id = %key, "eviction candidate changed, selecting again");
        }
    }

    /// 当前最久未访问的条目及其版本
    fn lru_candidate(&self) -> Option<(String, u64)> {
        self.entries
            .iter()
            .min_by(|a, b| a.value().lru_cmp(b.value()))
            .map(|entry| (entry.key().clone(), entry.value().revision()))
    }

    fn remove_if_unchanged(&self, document_id: &str, revision: u64) -> bool {
        self.entries
            .remove_if(document_id, |_, entry| entry.revision() == revision)
            .is_some()
    }

    /// 使缓存失效
    pub fn invalidate(&self, document_id: &str) {
        if self.entries.remove(document_id).is_some() {
            self.metrics.record_invalidation();
            debug!(document_id, "cache invalidated");
        }
    }

    /// 清空缓存并重置统计
    pub fn clear(&self) {
        let _admission = self.admission.lock();
        self.entries.clear();
        self.metrics.reset();
    }

    /// 移除过期的条目
    ///
    /// 过期条目默认保留作为离线回退；需要回收内存时显式调用。
    ///
    /// # 返回
    /// - `usize`: 移除的条目数
    pub fn remove_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0usize;
        self.entries.retain(|_, entry| {
            let keep = entry.is_valid_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        self.metrics.record_expirations(removed as u64);
        removed
    }

    /// 预热缓存
    ///
    /// 批量写入，通常用于启动时预加载热数据。
    pub fn warm_up<I, B>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, B)>,
        B: Into<Bytes>,
    {
        for (document_id, payload) in entries {
            self.put(&document_id, payload, None);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.entries.contains_key(document_id)
    }

    /// 获取缓存统计快照
    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot(self.len())
    }

    /// 获取缓存健康状态
    pub fn health(&self) -> CacheHealth {
        let size = self.len();
        let capacity = self.policy.capacity();
        CacheHealth {
            size,
            capacity,
            utilization: (size as f64) / (capacity as f64),
            hit_rate: self.metrics.hit_rate(),
        }
    }
}

/// 缓存健康状态
#[derive(Debug, Clone, Serialize)]
pub struct CacheHealth {
    /// 当前缓存大小
    pub size: usize,
    /// 缓存容量
    pub capacity: usize,
    /// 利用率 (0.0 - 1.0)
    pub utilization: f64,
    /// 命中率
    pub hit_rate: f64,
}
