//! # Resilience Module
//!
//! 网络拉取的容错层。
//!
//! ## 模块结构
//!
//! - `config`: 重试策略与熔断器配置
//! - `retry`: 指数退避计算
//! - `breaker`: 三态熔断器
//! - `fetcher`: 缓存优先 + 重试 + 熔断 + 离线回退
//! - `stats`: 拉取统计
//! - `refresh`: 临近过期的后台刷新 (feature `background-refresh`)
//!
//! ## 示例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docvault_core::cache::{CachePolicy, FetchCache};
//! use docvault_core::resilience::{CircuitBreakerConfig, ResilientFetcher, RetryPolicy};
//! use docvault_core::SharedTransport;
//!
//! # async fn example(transport: SharedTransport) -> docvault_core::Result<()> {
//! let cache = Arc::new(FetchCache::new(CachePolicy::default()));
//! let fetcher = ResilientFetcher::new(
//!     transport,
//!     cache,
//!     RetryPolicy::default(),
//!     CircuitBreakerConfig::default(),
//! );
//!
//! let document = fetcher.fetch("doc-1").await?;
//! println!("{} bytes", document.len());
//! # Ok(())
//! # }
//! ```

pub mod breaker;
pub mod config;
pub mod fetcher;
pub mod retry;
pub mod stats;

#[cfg(feature = "background-refresh")]
mod refresh;

#[cfg(test)]
mod integration_tests;

pub use breaker::{BreakerPermit, BreakerSnapshot, CircuitBreaker, CircuitOpenError, CircuitState};
pub use config::{CircuitBreakerConfig, RetryPolicy};
pub use fetcher::ResilientFetcher;
pub use retry::Backoff;
pub use stats::{FetchStats, FetchStatsSnapshot};
