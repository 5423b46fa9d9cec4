//! Backoff schedule for [`RetryPolicy`].

use std::time::Duration;

use super::config::RetryPolicy;

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-indexed):
    /// `min(initial_delay * factor^attempt, max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay();
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.initial_delay().as_secs_f64() * self.factor().powi(exponent);
        if !scaled.is_finite() || scaled >= self.max_delay().as_secs_f64() {
            return self.max_delay();
        }
        Duration::from_secs_f64(scaled)
    }

    /// The full schedule, one delay per allowed retry.
    pub fn backoff(&self) -> Backoff<'_> {
        Backoff {
            policy: self,
            attempt: 0,
        }
    }
}

/// Iterator over the delays of a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct Backoff<'a> {
    policy: &'a RetryPolicy,
    attempt: u32,
}

impl Iterator for Backoff<'_> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt >= self.policy.max_retries() {
            return None;
        }
        let delay = self.policy.delay_for(self.attempt);
        self.attempt += 1;
        Some(delay)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.policy.max_retries() - self.attempt) as usize;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_secs(1), Duration::from_secs(10), 2.0).unwrap()
    }

    #[test]
    fn test_exponential_schedule_is_capped() {
        let delays: Vec<_> = policy(5).backoff().collect();
        let secs = Duration::from_secs;
        assert_eq!(delays, vec![secs(1), secs(2), secs(4), secs(8), secs(10)]);
    }

    #[test]
    fn test_no_retries_no_delays() {
        assert_eq!(policy(0).backoff().count(), 0);
    }

    #[test]
    fn test_large_attempt_saturates() {
        let p = policy(3);
        assert_eq!(p.delay_for(64), Duration::from_secs(10));
        assert_eq!(p.delay_for(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_fractional_factor() {
        let p = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(1), 1.5).unwrap();
        let millis = p.delay_for(1).as_millis();
        assert!((149..=150).contains(&millis));
    }

    #[test]
    fn test_size_hint() {
        let p = policy(4);
        let mut backoff = p.backoff();
        backoff.next();
        assert_eq!(backoff.size_hint(), (3, Some(3)));
    }
}
