//! # Resilient Fetcher
//!
//! 缓存优先的文档拉取：
//!
//! ```text
//! fetch(id)
//!   ├─ cache.get_if_valid(id) 命中 ──────────────▶ 直接返回 (不访问网络)
//!   └─ 未命中/已过期
//!        ├─ breaker.try_acquire()  OPEN ─────────▶ 回退
//!        ├─ transport.fetch_bytes(id)
//!        │    ├─ 成功 ──▶ breaker 记成功, cache.put ─▶ 返回
//!        │    └─ 失败 ──▶ breaker 记失败
//!        │         ├─ 可重试且未超过次数、熔断未打开 ─▶ 退避后重试
//!        │         └─ 否则 ──────────────────────▶ 回退
//!        └─ 回退: cache.get(id) 存在 (即使过期) ─▶ 返回旧内容
//!                 不存在 ────────────────────────▶ NetworkUnavailable
//! ```
//!
//! Cancelling a fetch (dropping the future, or `fetch_with_cancel`) aborts the
//! pending transport call or backoff sleep. The breaker permit held by the
//! aborted call is released without an outcome and the cache is only written
//! after a completed transport success.

use std::sync::Arc;

use bytes::Bytes;
use docvault_traits::{SharedTransport, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::cache::{CacheEntry, CacheMetricsSnapshot, FetchCache};
use crate::config::DocVaultConfig;
use crate::error::{DocVaultError, FetchFailure, Result};

use super::breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
use super::config::{CircuitBreakerConfig, RetryPolicy};
use super::stats::{FetchStats, FetchStatsSnapshot};

/// 带重试、熔断与离线回退的文档拉取器
pub struct ResilientFetcher {
    transport: SharedTransport,
    cache: Arc<FetchCache>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    stats: Arc<FetchStats>,
    #[cfg(feature = "background-refresh")]
    refreshing: Arc<dashmap::DashSet<String>>,
}

impl ResilientFetcher {
    /// 创建拉取器
    ///
    /// The breaker reads the cache's clock so TTL and recovery timing share
    /// one time source.
    pub fn new(
        transport: SharedTransport,
        cache: Arc<FetchCache>,
        retry: RetryPolicy,
        breaker_config: CircuitBreakerConfig,
    ) -> Self {
        let breaker = CircuitBreaker::with_clock(
            transport.name().to_string(),
            breaker_config,
            cache.clock().clone(),
        );
        Self {
            transport,
            cache,
            breaker: Arc::new(breaker),
            retry,
            stats: Arc::new(FetchStats::new()),
            #[cfg(feature = "background-refresh")]
            refreshing: Arc::new(dashmap::DashSet::new()),
        }
    }

    /// 按配置创建拉取器及其独占的缓存
    pub fn from_config(config: &DocVaultConfig, transport: SharedTransport) -> Self {
        let cache = Arc::new(FetchCache::new(config.cache.clone()));
        Self::new(transport, cache, config.retry.clone(), config.breaker.clone())
    }

    pub fn cache(&self) -> &Arc<FetchCache> {
        &self.cache
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// 拉取文档
    ///
    /// Only fails with [`DocVaultError::NetworkUnavailable`], when the
    /// transport is exhausted and nothing is cached for `document_id`.
    pub async fn fetch(&self, document_id: &str) -> Result<Bytes> {
        self.stats.record_request();

        if let Some(entry) = self.cache.get_if_valid(document_id) {
            self.stats.record_cache_hit();
            #[cfg(feature = "background-refresh")]
            self.maybe_schedule_refresh(&entry);
            return Ok(entry.into_payload());
        }

        match self.fetch_remote(document_id).await {
            Ok(bytes) => Ok(bytes),
            Err(cause) => self.fallback(document_id, cause),
        }
    }

    /// [`fetch`](Self::fetch) that stops as soon as `cancel` fires.
    pub async fn fetch_with_cancel(
        &self,
        document_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(document_id, "fetch cancelled");
                Err(DocVaultError::Cancelled {
                    document_id: document_id.to_string(),
                })
            }
            result = self.fetch(document_id) => result,
        }
    }

    /// 经熔断器访问网络，按策略重试
    async fn fetch_remote(&self, document_id: &str) -> std::result::Result<Bytes, FetchFailure> {
        let mut last_error: Option<TransportError> = None;
        let mut attempt: u32 = 0;

        loop {
            let permit = match self.breaker.try_acquire() {
                Ok(permit) => permit,
                Err(open) => {
                    self.stats.record_circuit_rejection();
                    debug!(document_id, retry_after = ?open.retry_after, "circuit open, skipping transport");
                    return Err(match last_error {
                        Some(err) => FetchFailure::Transport(err),
                        None => open.into(),
                    });
                }
            };

            self.stats.record_attempt();
            debug!(
                document_id,
                attempt,
                transport = self.transport.name(),
                trial = permit.is_trial(),
                "transport attempt"
            );

            let err = match self.transport.fetch_bytes(document_id).await {
                Ok(bytes) => {
                    permit.record_success();
                    self.cache.put(document_id, bytes.clone(), None);
                    return Ok(bytes);
                }
                Err(err) => err,
            };

            self.stats.record_transport_failure();
            let state = permit.record_failure();
            warn!(document_id, attempt, error = %err, "transport attempt failed");

            if !err.is_transient() {
                debug!(document_id, "permanent failure, not retrying");
                return Err(err.into());
            }
            if state == CircuitState::Open {
                debug!(document_id, "circuit opened, aborting remaining retries");
                return Err(err.into());
            }
            if attempt >= self.retry.max_retries() {
                return Err(err.into());
            }
            last_error = Some(err);

            let delay = self.retry.delay_for(attempt);
            debug!(document_id, attempt, ?delay, "backing off before retry");
            tokio::time::sleep(delay).await;
            attempt += 1;
            self.stats.record_retry();
        }
    }

    /// 离线回退：返回任何已缓存的内容，即使已过期
    fn fallback(&self, document_id: &str, cause: FetchFailure) -> Result<Bytes> {
        if let Some(entry) = self.cache.get(document_id) {
            self.stats.record_stale_fallback();
            let now = self.cache.now();
            warn!(
                document_id,
                age = ?entry.age(now),
                expired = !entry.is_valid_at(now),
                cause = %cause,
                "serving cached document after fetch failure"
            );
            return Ok(entry.into_payload());
        }

        self.stats.record_terminal_failure();
        error!(document_id, cause = %cause, "document unavailable: fetch failed and nothing is cached");
        Err(DocVaultError::network_unavailable(document_id, cause))
    }

    #[cfg(feature = "background-refresh")]
    fn maybe_schedule_refresh(&self, entry: &CacheEntry) {
        let threshold = self.cache.policy().refresh_threshold();
        if threshold.is_zero() || entry.remaining_ttl(self.cache.now()) > threshold {
            return;
        }

        let document_id = entry.document_id().to_string();
        if !self.refreshing.insert(document_id.clone()) {
            return;
        }

        debug!(document_id = %document_id, "scheduling background refresh");
        let task = super::refresh::RefreshTask {
            document_id,
            transport: self.transport.clone(),
            cache: self.cache.clone(),
            breaker: self.breaker.clone(),
            stats: self.stats.clone(),
            refreshing: self.refreshing.clone(),
        };
        tokio::spawn(task.run());
    }

    /// 只读查看缓存，不影响 LRU 与统计
    pub fn peek(&self, document_id: &str) -> Option<CacheEntry> {
        self.cache.peek(document_id)
    }

    pub fn invalidate(&self, document_id: &str) {
        self.cache.invalidate(document_id);
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.cache.metrics()
    }

    pub fn stats(&self) -> FetchStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }
}
