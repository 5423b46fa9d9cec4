//! # Resilience Configuration
//!
//! Retry/backoff and circuit breaker settings. Both are validated at
//! construction and immutable afterwards.

use std::time::Duration;

use crate::error::{DocVaultError, Result};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(200);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_HALF_OPEN_MAX_CALLS: u32 = 1;

/// Retry policy with capped exponential backoff
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = single attempt)
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    /// Multiplicative growth per retry (> 1.0)
    factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        factor: f64,
    ) -> Result<Self> {
        if initial_delay.is_zero() {
            return Err(DocVaultError::configuration(
                "retry initial_delay must be greater than 0",
            ));
        }
        if initial_delay > max_delay {
            return Err(DocVaultError::configuration(format!(
                "retry initial_delay ({:?}) must not exceed max_delay ({:?})",
                initial_delay, max_delay
            )));
        }
        if !factor.is_finite() || factor <= 1.0 {
            return Err(DocVaultError::configuration(format!(
                "retry factor must be a finite number greater than 1.0, got {}",
                factor
            )));
        }

        Ok(Self {
            max_retries,
            initial_delay,
            max_delay,
            factor,
        })
    }

    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

/// Circuit breaker settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    failure_threshold: u32,
    /// Time spent OPEN before trial calls are let through
    recovery_timeout: Duration,
    /// Trial calls allowed while HALF_OPEN
    half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            half_open_max_calls: DEFAULT_HALF_OPEN_MAX_CALLS,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new(
        failure_threshold: u32,
        recovery_timeout: Duration,
        half_open_max_calls: u32,
    ) -> Result<Self> {
        if failure_threshold == 0 {
            return Err(DocVaultError::configuration(
                "breaker failure_threshold must be greater than 0",
            ));
        }
        if recovery_timeout.is_zero() {
            return Err(DocVaultError::configuration(
                "breaker recovery_timeout must be greater than 0",
            ));
        }
        if half_open_max_calls == 0 {
            return Err(DocVaultError::configuration(
                "breaker half_open_max_calls must be greater than 0",
            ));
        }

        Ok(Self {
            failure_threshold,
            recovery_timeout,
            half_open_max_calls,
        })
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn recovery_timeout(&self) -> Duration {
        self.recovery_timeout
    }

    pub fn half_open_max_calls(&self) -> u32 {
        self.half_open_max_calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.initial_delay(), Duration::from_millis(200));
        assert_eq!(policy.max_delay(), Duration::from_secs(10));
        assert_eq!(policy.factor(), 2.0);
    }

    #[test]
    fn test_retry_policy_validation() {
        let secs = Duration::from_secs;
        assert!(RetryPolicy::new(0, secs(1), secs(1), 1.5).is_ok());
        assert!(RetryPolicy::new(3, Duration::ZERO, secs(1), 2.0).is_err());
        assert!(RetryPolicy::new(3, secs(5), secs(1), 2.0).is_err());
        assert!(RetryPolicy::new(3, secs(1), secs(5), 1.0).is_err());
        assert!(RetryPolicy::new(3, secs(1), secs(5), 0.5).is_err());
        assert!(RetryPolicy::new(3, secs(1), secs(5), f64::NAN).is_err());
        assert!(RetryPolicy::new(3, secs(1), secs(5), f64::INFINITY).is_err());
    }

    #[test]
    fn test_no_retry() {
        assert_eq!(RetryPolicy::no_retry().max_retries(), 0);
    }

    #[test]
    fn test_breaker_config_validation() {
        let timeout = Duration::from_secs(1);
        assert!(CircuitBreakerConfig::new(5, timeout, 1).is_ok());
        assert!(CircuitBreakerConfig::new(0, timeout, 1).is_err());
        assert!(CircuitBreakerConfig::new(5, Duration::ZERO, 1).is_err());
        assert!(CircuitBreakerConfig::new(5, timeout, 0).is_err());
    }

    #[test]
    fn test_default_breaker_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold(), 5);
        assert_eq!(config.recovery_timeout(), Duration::from_secs(30));
        assert_eq!(config.half_open_max_calls(), 1);
    }
}
