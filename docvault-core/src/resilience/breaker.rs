//! # Circuit Breaker
//!
//! 三态熔断器：CLOSED → OPEN → HALF_OPEN → CLOSED。
//!
//! ```text
//! CLOSED ──(连续失败数 >= failure_threshold)──▶ OPEN
//!   ▲                                           │
//!   │                              (经过 recovery_timeout，
//!   │                               下一次调用时惰性转换)
//!   │                                           ▼
//!   └──────────(试探调用成功)────────────── HALF_OPEN
//!                                               │
//!                      OPEN ◀──(任一试探失败，计时重新开始)
//! ```
//!
//! Every call goes through a [`BreakerPermit`]. A permit dropped without an
//! outcome (the caller was cancelled) is neither a success nor a failure; it
//! only hands its HALF_OPEN trial slot back. Outcomes of permits issued
//! before the latest state transition are ignored.

use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::clock::{system_clock, Clock, SharedClock};
use crate::error::FetchFailure;

use super::config::CircuitBreakerConfig;

/// 熔断器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Raised when a call is rejected without reaching the transport.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("circuit breaker is open (retry after {retry_after:?})")]
pub struct CircuitOpenError {
    pub retry_after: Duration,
}

impl From<CircuitOpenError> for FetchFailure {
    fn from(err: CircuitOpenError) -> Self {
        FetchFailure::CircuitOpen {
            retry_after: err.retry_after,
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    half_open_trials: u32,
    /// Bumped on every transition
    generation: u64,
    times_opened: u64,
}

/// 熔断器
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
    clock: SharedClock,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_clock(name, config, system_clock())
    }

    pub fn with_clock(name: impl Into<String>, config: CircuitBreakerConfig, clock: SharedClock) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                half_open_trials: 0,
                generation: 0,
                times_opened: 0,
            }),
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    /// 申请一次调用许可
    ///
    /// OPEN 且未到恢复时间时快速失败；到期后转为 HALF_OPEN 并发放试探许可。
    pub fn try_acquire(&self) -> Result<BreakerPermit<'_>, CircuitOpenError> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if inner.state == CircuitState::Open {
            let opened_at = inner.opened_at.unwrap_or(now);
            let elapsed = now.saturating_duration_since(opened_at);
            if elapsed < self.config.recovery_timeout() {
                return Err(CircuitOpenError {
                    retry_after: self.config.recovery_timeout() - elapsed,
                });
            }
            self.transition(&mut inner, CircuitState::HalfOpen, now);
        }

        let trial = inner.state == CircuitState::HalfOpen;
        if trial {
            if inner.half_open_trials >= self.config.half_open_max_calls() {
                debug!(breaker = %self.name, "half-open trial slots exhausted");
                return Err(CircuitOpenError {
                    retry_after: Duration::ZERO,
                });
            }
            inner.half_open_trials += 1;
        }

        Ok(BreakerPermit {
            breaker: self,
            generation: inner.generation,
            trial,
            settled: false,
        })
    }

    /// 强制恢复为 CLOSED
    pub fn reset(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.transition(&mut inner, CircuitState::Closed, now);
        inner.consecutive_failures = 0;
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let now = self.clock.now();
        let inner = self.inner.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            times_opened: inner.times_opened,
            open_for: match inner.state {
                CircuitState::Open => inner.opened_at.map(|at| now.saturating_duration_since(at)),
                _ => None,
            },
        }
    }

    fn on_success(&self, generation: u64) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!(breaker = %self.name, "ignoring success from a previous breaker state");
            return;
        }

        match inner.state {
            CircuitState::Closed => inner.consecutive_failures = 0,
            CircuitState::HalfOpen => self.transition(&mut inner, CircuitState::Closed, now),
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, generation: u64) -> CircuitState {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!(breaker = %self.name, "ignoring failure from a previous breaker state");
            return inner.state;
        }

        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                if inner.consecutive_failures >= self.config.failure_threshold() {
                    self.transition(&mut inner, CircuitState::Open, now);
                }
            }
            CircuitState::HalfOpen => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                self.transition(&mut inner, CircuitState::Open, now);
            }
            CircuitState::Open => {}
        }
        inner.state
    }

    fn on_cancelled(&self, generation: u64, trial: bool) {
        let mut inner = self.inner.lock();
        if trial && inner.generation == generation && inner.state == CircuitState::HalfOpen {
            inner.half_open_trials = inner.half_open_trials.saturating_sub(1);
        }
        debug!(breaker = %self.name, trial, "call cancelled before an outcome was recorded");
    }

    fn transition(&self, inner: &mut BreakerInner, to: CircuitState, now: Instant) {
        let from = inner.state;
        if from == to {
            return;
        }

        inner.state = to;
        inner.generation += 1;
        inner.half_open_trials = 0;

        match to {
            CircuitState::Open => {
                inner.opened_at = Some(now);
                inner.times_opened += 1;
                warn!(
                    breaker = %self.name,
                    ?from,
                    failures = inner.consecutive_failures,
                    recovery_timeout = ?self.config.recovery_timeout(),
                    "circuit opened"
                );
            }
            CircuitState::HalfOpen => {
                info!(breaker = %self.name, "circuit half-open, allowing trial calls");
            }
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                info!(breaker = %self.name, ?from, "circuit closed");
            }
        }
    }
}

/// Permission for one call through the breaker.
#[must_use = "a permit must record an outcome or be dropped on cancellation"]
#[derive(Debug)]
pub struct BreakerPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
    settled: bool,
}

impl BreakerPermit<'_> {
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn record_success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.generation);
    }

    /// Returns the breaker state after the failure was counted.
    pub fn record_failure(mut self) -> CircuitState {
        self.settled = true;
        self.breaker.on_failure(self.generation)
    }
}

impl Drop for BreakerPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.on_cancelled(self.generation, self.trial);
        }
    }
}

/// 熔断器状态快照
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub times_opened: u64,
    /// Time spent in the current OPEN period
    pub open_for: Option<Duration>,
}
