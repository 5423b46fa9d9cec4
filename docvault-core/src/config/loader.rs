//! # Configuration Loader
//!
//! Loads and merges configuration from multiple sources:
//! 1. Default values (lowest priority)
//! 2. Configuration file (middle priority)
//! 3. Environment variables (highest priority)
//!
//! The merged values are validated by the policy constructors, so an invalid
//! combination is reported no matter which source it came from.

use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::cache::CachePolicy;
use crate::config::DocVaultConfig;
use crate::error::{DocVaultError, Result};
use crate::resilience::{CircuitBreakerConfig, RetryPolicy};

const DEFAULT_ENV_PREFIX: &str = "DOCVAULT";

/// Configuration loader with support for file and environment variable overrides
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Path to configuration file
    config_path: PathBuf,

    /// Environment variable prefix
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config loader with a specific config file path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Replace the environment variable prefix (`DOCVAULT` by default)
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// `$DOCVAULT_CONFIG`, then `./docvault.toml`, then the user config dir.
    fn default_config_path() -> PathBuf {
        if let Ok(config_path) = env::var("DOCVAULT_CONFIG") {
            return PathBuf::from(config_path);
        }

        let local = PathBuf::from("docvault.toml");
        if local.exists() {
            return local;
        }

        match dirs::config_dir().map(|d| d.join("docvault").join("config.toml")) {
            Some(path) if path.exists() => path,
            _ => local,
        }
    }

    /// Load configuration with full hierarchy
    pub fn load(&self) -> Result<DocVaultConfig> {
        let mut settings = Settings::default();

        if self.config_path.exists() {
            debug!(path = %self.config_path.display(), "loading config file");
            let file_config = self.load_from_file()?;
            settings.merge_file(file_config);
        } else {
            debug!(path = %self.config_path.display(), "config file not found, using defaults");
        }

        self.merge_env(&mut settings)?;

        settings.build().map_err(|e| match e {
            DocVaultError::Configuration(msg) => {
                DocVaultError::configuration(format!("Configuration validation failed: {}", msg))
            }
            other => other,
        })
    }

    fn load_from_file(&self) -> Result<FileConfig> {
        let content = std::fs::read_to_string(&self.config_path).map_err(|e| {
            DocVaultError::configuration(format!(
                "Failed to read config file '{}': {}",
                self.config_path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            DocVaultError::configuration(format!(
                "Failed to parse config file '{}': {}",
                self.config_path.display(),
                e
            ))
        })
    }

    fn merge_env(&self, settings: &mut Settings) -> Result<()> {
        // Cache
        if let Some(v) = self.env_var("CACHE_CAPACITY")? {
            settings.capacity = v;
        }
        if let Some(v) = self.env_var("CACHE_DEFAULT_TTL_MS")? {
            settings.default_ttl = Duration::from_millis(v);
        }
        if let Some(v) = self.env_var("CACHE_REFRESH_THRESHOLD_MS")? {
            settings.refresh_threshold = Some(Duration::from_millis(v));
        }

        // Retry
        if let Some(v) = self.env_var("RETRY_MAX_RETRIES")? {
            settings.max_retries = v;
        }
        if let Some(v) = self.env_var("RETRY_INITIAL_DELAY_MS")? {
            settings.initial_delay = Duration::from_millis(v);
        }
        if let Some(v) = self.env_var("RETRY_MAX_DELAY_MS")? {
            settings.max_delay = Duration::from_millis(v);
        }
        if let Some(v) = self.env_var("RETRY_FACTOR")? {
            settings.factor = v;
        }

        // Breaker
        if let Some(v) = self.env_var("BREAKER_FAILURE_THRESHOLD")? {
            settings.failure_threshold = v;
        }
        if let Some(v) = self.env_var("BREAKER_RECOVERY_TIMEOUT_MS")? {
            settings.recovery_timeout = Duration::from_millis(v);
        }
        if let Some(v) = self.env_var("BREAKER_HALF_OPEN_MAX_CALLS")? {
            settings.half_open_max_calls = v;
        }

        Ok(())
    }

    /// Reads and parses `<PREFIX>_<key>`; unset is `None`.
    fn env_var<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        let name = format!("{}_{}", self.env_prefix, key);
        match env::var(&name) {
            Ok(val) => val.trim().parse().map(Some).map_err(|e| {
                DocVaultError::configuration(format!("Invalid value for {}: '{}' ({})", name, val, e))
            }),
            Err(_) => Ok(None),
        }
    }
}

/// Flat working copy of every setting, seeded with defaults
#[derive(Debug)]
struct Settings {
    capacity: usize,
    default_ttl: Duration,
    /// Unset: derived from `default_ttl` like `CachePolicy::with_capacity_and_ttl`
    refresh_threshold: Option<Duration>,
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    factor: f64,
    failure_threshold: u32,
    recovery_timeout: Duration,
    half_open_max_calls: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let DocVaultConfig {
            cache,
            retry,
            breaker,
        } = DocVaultConfig::default();
        Self {
            capacity: cache.capacity(),
            default_ttl: cache.default_ttl(),
            refresh_threshold: None,
            max_retries: retry.max_retries(),
            initial_delay: retry.initial_delay(),
            max_delay: retry.max_delay(),
            factor: retry.factor(),
            failure_threshold: breaker.failure_threshold(),
            recovery_timeout: breaker.recovery_timeout(),
            half_open_max_calls: breaker.half_open_max_calls(),
        }
    }
}

impl Settings {
    fn merge_file(&mut self, file: FileConfig) {
        if let Some(cache) = file.cache {
            if let Some(capacity) = cache.capacity {
                self.capacity = capacity;
            }
            if let Some(ms) = cache.default_ttl_ms {
                self.default_ttl = Duration::from_millis(ms);
            }
            if let Some(ms) = cache.refresh_threshold_ms {
                self.refresh_threshold = Some(Duration::from_millis(ms));
            }
        }

        if let Some(retry) = file.retry {
            if let Some(max_retries) = retry.max_retries {
                self.max_retries = max_retries;
            }
            if let Some(ms) = retry.initial_delay_ms {
                self.initial_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = retry.max_delay_ms {
                self.max_delay = Duration::from_millis(ms);
            }
            if let Some(factor) = retry.factor {
                self.factor = factor;
            }
        }

        if let Some(breaker) = file.breaker {
            if let Some(threshold) = breaker.failure_threshold {
                self.failure_threshold = threshold;
            }
            if let Some(ms) = breaker.recovery_timeout_ms {
                self.recovery_timeout = Duration::from_millis(ms);
            }
            if let Some(calls) = breaker.half_open_max_calls {
                self.half_open_max_calls = calls;
            }
        }
    }

    fn build(self) -> Result<DocVaultConfig> {
        let cache = match self.refresh_threshold {
            Some(threshold) => CachePolicy::new(self.capacity, self.default_ttl, threshold)?,
            None => CachePolicy::with_capacity_and_ttl(self.capacity, self.default_ttl)?,
        };

        Ok(DocVaultConfig {
            cache,
            retry: RetryPolicy::new(
                self.max_retries,
                self.initial_delay,
                self.max_delay,
                self.factor,
            )?,
            breaker: CircuitBreakerConfig::new(
                self.failure_threshold,
                self.recovery_timeout,
                self.half_open_max_calls,
            )?,
        })
    }
}

// File configuration structures (all fields optional for partial configs)

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    cache: Option<FileCacheConfig>,
    retry: Option<FileRetryConfig>,
    breaker: Option<FileBreakerConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct FileCacheConfig {
    capacity: Option<usize>,
    default_ttl_ms: Option<u64>,
    refresh_threshold_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileRetryConfig {
    max_retries: Option<u32>,
    initial_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    factor: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileBreakerConfig {
    failure_threshold: Option<u32>,
    recovery_timeout_ms: Option<u64>,
    half_open_max_calls: Option<u32>,
}
