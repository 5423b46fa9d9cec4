//! # DocVault Core Library
//!
//! Cache-first document fetching for clients that must keep working while
//! the network is unreliable or gone.
//!
//! ## Architecture
//!
//! ```text
//! ResilientFetcher::fetch(id)
//!   │
//!   ├─▶ FetchCache         TTL + LRU, 过期条目保留用于离线回退
//!   ├─▶ CircuitBreaker     连续失败后快速失败，超时后试探恢复
//!   ├─▶ RetryPolicy        有上限的指数退避
//!   └─▶ Transport          外部边界 (docvault-traits)，内置 HTTP 实现
//! ```
//!
//! - **cache**: 文档缓存与统计
//! - **resilience**: 重试、熔断、拉取器
//! - **config**: 默认值 → TOML 文件 → 环境变量
//! - **clock**: 缓存与熔断器共享的单调时钟
//! - **transport**: `HttpTransport` (feature `http`)
//! - **telemetry**: tracing 订阅者初始化
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docvault_core::{DocVaultConfig, ResilientFetcher};
//! use docvault_core::transport::HttpTransport;
//!
//! # async fn run() -> docvault_core::Result<()> {
//! docvault_core::telemetry::init_tracing("docvault_core=info");
//!
//! let config = DocVaultConfig::load()?;
//! let transport = Arc::new(HttpTransport::new("https://docs.example.com/v1")?);
//! let fetcher = ResilientFetcher::from_config(&config, transport);
//!
//! let document = fetcher.fetch("handbook").await?;
//! println!("{} bytes, hit rate {:.2}", document.len(), fetcher.metrics().hit_rate);
//! # Ok(())
//! # }
//! ```

pub use docvault_traits::{SharedTransport, Transport, TransportError};

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod resilience;
pub mod telemetry;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{CacheEntry, CacheMetricsSnapshot, CachePolicy, FetchCache};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{ConfigLoader, DocVaultConfig};
pub use error::{DocVaultError, FetchFailure, Result};
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, ResilientFetcher, RetryPolicy,
};
