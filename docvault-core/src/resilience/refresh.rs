//! Background refresh of entries close to expiry.
//!
//! 命中仍返回缓存内容；剩余 TTL 低于 `refresh_threshold` 时，后台发起一次
//! 经熔断器的拉取，成功后覆盖缓存。每个文档同时最多一个刷新任务。

use std::sync::Arc;

use dashmap::DashSet;
use docvault_traits::SharedTransport;
use tracing::debug;

use crate::cache::FetchCache;

use super::breaker::CircuitBreaker;
use super::stats::FetchStats;

pub(crate) struct RefreshTask {
    pub(crate) document_id: String,
    pub(crate) transport: SharedTransport,
    pub(crate) cache: Arc<FetchCache>,
    pub(crate) breaker: Arc<CircuitBreaker>,
    pub(crate) stats: Arc<FetchStats>,
    pub(crate) refreshing: Arc<DashSet<String>>,
}

impl RefreshTask {
    pub(crate) async fn run(self) {
        let _guard = InFlight {
            set: &self.refreshing,
            document_id: &self.document_id,
        };
        self.stats.record_background_refresh();

        let permit = match self.breaker.try_acquire() {
            Ok(permit) => permit,
            Err(open) => {
                debug!(document_id = %self.document_id, retry_after = ?open.retry_after, "skipping refresh, circuit open");
                return;
            }
        };

        self.stats.record_attempt();
        match self.transport.fetch_bytes(&self.document_id).await {
            Ok(bytes) => {
                permit.record_success();
                self.cache.put(&self.document_id, bytes, None);
                debug!(document_id = %self.document_id, "background refresh stored");
            }
            Err(err) => {
                self.stats.record_transport_failure();
                permit.record_failure();
                debug!(document_id = %self.document_id, error = %err, "background refresh failed");
            }
        }
    }
}

/// Clears the in-flight marker however the task ends.
struct InFlight<'a> {
    set: &'a DashSet<String>,
    document_id: &'a str,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(self.document_id);
    }
}
