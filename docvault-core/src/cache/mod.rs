//! # Cache Module
//!
//! 文档缓存层实现。
//!
//! ## 模块结构
//!
//! - `config`: 缓存策略
//! - `entry`: 缓存条目
//! - `lru`: 缓存核心实现 (TTL + LRU)
//! - `metrics`: 缓存统计
//!
//! ## 特性
//!
//! - LRU 淘汰策略 (访问时间 → 写入时间 → 键)
//! - TTL 支持，过期条目保留用于离线回退
//! - 线程安全，分片锁
//! - 缓存统计
//!
//! ## 示例
//!
//! ```rust
//! use docvault_core::cache::{CachePolicy, FetchCache};
//!
//! let cache = FetchCache::new(CachePolicy::default());
//!
//! cache.put("doc-1", b"value".to_vec(), None);
//! if let Some(entry) = cache.get("doc-1") {
//!     println!("Cache hit: {:?}", entry.payload());
//! }
//!
//! let metrics = cache.metrics();
//! println!("Hit rate: {:.2}%", metrics.hit_rate * 100.0);
//! ```

pub mod config;
pub mod entry;
pub mod lru;
pub mod metrics;

pub use config::CachePolicy;
pub use entry::CacheEntry;
pub use lru::{CacheHealth, FetchCache};
pub use metrics::{CacheMetrics, CacheMetricsSnapshot};
