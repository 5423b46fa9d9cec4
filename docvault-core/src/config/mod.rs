//! # Configuration
//!
//! 缓存、重试与熔断器配置的统一入口。
//!
//! ## Configuration Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Environment Variables           │
//! │    DOCVAULT_CACHE_CAPACITY=500          │
//! ├─────────────────────────────────────────┤
//! │         Config File (docvault.toml)     │
//! │    [cache]                              │
//! │    capacity = 500                       │
//! ├─────────────────────────────────────────┤
//! │         Default Values                  │
//! │    CachePolicy::default() ...           │
//! └─────────────────────────────────────────┘
//! ```

mod loader;

pub use loader::ConfigLoader;

use crate::cache::CachePolicy;
use crate::error::Result;
use crate::resilience::{CircuitBreakerConfig, RetryPolicy};

/// 完整配置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocVaultConfig {
    pub cache: CachePolicy,
    pub retry: RetryPolicy,
    pub breaker: CircuitBreakerConfig,
}

impl DocVaultConfig {
    /// Load from the default file location and `DOCVAULT_*` environment.
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }
}
