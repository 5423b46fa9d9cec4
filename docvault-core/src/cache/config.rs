//! # Cache Policy
//!
//! 缓存策略配置，构造后不可变。
//!
//! ## 配置选项
//!
//! - `capacity`: 最大缓存条目数
//! - `default_ttl`: 默认 TTL (Time To Live)
//! - `refresh_threshold`: 距离过期多久时触发后台刷新 (0 表示关闭)
//!
//! ## 示例
//!
//! ```rust
//! use docvault_core::cache::CachePolicy;
//! use std::time::Duration;
//!
//! // 使用默认配置
//! let policy = CachePolicy::default();
//!
//! // 自定义配置，非法值在构造时即报错
//! let policy = CachePolicy::new(2000, Duration::from_secs(600), Duration::from_secs(60))?;
//! assert!(CachePolicy::new(0, Duration::from_secs(600), Duration::ZERO).is_err());
//! # Ok::<(), docvault_core::error::DocVaultError>(())
//! ```

use std::time::Duration;

use crate::error::{DocVaultError, Result};

pub const DEFAULT_CAPACITY: usize = 1000;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(30);

/// 缓存策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// 最大缓存条目数
    ///
    /// 插入新键且已满时，触发 LRU 淘汰。
    capacity: usize,

    /// 默认 TTL
    ///
    /// `put` 未指定 TTL 时使用。
    default_ttl: Duration,

    /// 后台刷新阈值
    ///
    /// 剩余有效期小于该值时，命中可触发一次后台刷新 (需要
    /// `background-refresh` feature)。
    refresh_threshold: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            default_ttl: DEFAULT_TTL,
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
        }
    }
}

impl CachePolicy {
    /// 创建并验证缓存策略
    ///
    /// # 参数
    /// - `capacity`: 最大缓存条目数 (> 0)
    /// - `default_ttl`: 默认 TTL (> 0)
    /// - `refresh_threshold`: 必须小于 `default_ttl`
    pub fn new(capacity: usize, default_ttl: Duration, refresh_threshold: Duration) -> Result<Self> {
        let policy = Self {
            capacity,
            default_ttl,
            refresh_threshold,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// 使用默认刷新阈值；阈值不小于 TTL 时关闭刷新
    pub fn with_capacity_and_ttl(capacity: usize, default_ttl: Duration) -> Result<Self> {
        let refresh_threshold = if DEFAULT_REFRESH_THRESHOLD < default_ttl {
            DEFAULT_REFRESH_THRESHOLD
        } else {
            Duration::ZERO
        };
        Self::new(capacity, default_ttl, refresh_threshold)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn refresh_threshold(&self) -> Duration {
        self.refresh_threshold
    }

    /// 验证配置是否有效
    fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(DocVaultError::configuration(
                "cache capacity must be greater than 0",
            ));
        }

        if self.default_ttl.is_zero() {
            return Err(DocVaultError::configuration(
                "cache default_ttl must be greater than 0",
            ));
        }

        if self.refresh_threshold >= self.default_ttl {
            return Err(DocVaultError::configuration(format!(
                "cache refresh_threshold ({:?}) must be less than default_ttl ({:?})",
                self.refresh_threshold, self.default_ttl
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = CachePolicy::default();
        assert_eq!(policy.capacity(), 1000);
        assert_eq!(policy.default_ttl(), Duration::from_secs(300));
        assert_eq!(policy.refresh_threshold(), Duration::from_secs(30));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_new_valid_policy() {
        let policy = CachePolicy::new(10, Duration::from_secs(60), Duration::ZERO).unwrap();
        assert_eq!(policy.capacity(), 10);
        assert_eq!(policy.refresh_threshold(), Duration::ZERO);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = CachePolicy::new(0, Duration::from_secs(60), Duration::ZERO).unwrap_err();
        assert!(matches!(err, DocVaultError::Configuration(_)));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert!(CachePolicy::new(10, Duration::ZERO, Duration::ZERO).is_err());
    }

    #[test]
    fn test_refresh_threshold_must_be_below_ttl() {
        assert!(CachePolicy::new(10, Duration::from_secs(5), Duration::from_secs(5)).is_err());
        assert!(CachePolicy::new(10, Duration::from_secs(5), Duration::from_secs(4)).is_ok());
    }

    #[test]
    fn test_short_ttl_disables_refresh() {
        let policy = CachePolicy::with_capacity_and_ttl(3, Duration::from_secs(10)).unwrap();
        assert_eq!(policy.refresh_threshold(), Duration::ZERO);

        let policy = CachePolicy::with_capacity_and_ttl(3, Duration::from_secs(600)).unwrap();
        assert_eq!(policy.refresh_threshold(), DEFAULT_REFRESH_THRESHOLD);
    }
}
