//! Retry policy: backoff schedule and retryability rules.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tollgate_error::{ConfigError, RequestErrorKind};

/// Immutable retry configuration.
///
/// `max_attempts` counts retries after the first attempt, so an operation is
/// invoked at most `max_attempts + 1` times.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tollgate_retry::RetryPolicy;
///
/// let policy = RetryPolicy::default()
///     .with_initial_delay_ms(100)
///     .with_max_delay_ms(1_000);
///
/// assert_eq!(policy.calculate_delay(1), Duration::from_millis(100));
/// assert_eq!(policy.calculate_delay(3), Duration::from_millis(400));
/// assert_eq!(policy.calculate_delay(10), Duration::from_millis(1_000));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RetryPolicy {
    /// Whether failed attempts are retried at all
    #[serde(default = "default_enabled")]
    enabled: bool,

    /// Retries after the first attempt
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(default = "default_initial_delay_ms")]
    initial_delay_ms: u64,

    /// Upper bound for any single delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    max_delay_ms: u64,

    /// Growth factor between consecutive delays
    #[serde(default = "default_backoff_multiplier")]
    backoff_multiplier: f64,

    /// Retry `Timeout` failures
    #[serde(default = "default_true")]
    retry_on_timeout: bool,

    /// Retry `RateLimited` failures and 429 responses
    #[serde(default = "default_true")]
    retry_on_rate_limit: bool,

    /// Retry any 5xx response
    #[serde(default = "default_true")]
    retry_on_server_error: bool,

    /// Retry failures where no response was received
    #[serde(default)]
    retry_on_network_error: bool,

    /// Status codes that are always retried
    #[serde(default = "default_retryable_status_codes")]
    retryable_status_codes: BTreeSet<u16>,

    /// Randomize each delay between zero and its computed value
    #[serde(default)]
    jitter: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_retryable_status_codes() -> BTreeSet<u16> {
    [429, 500, 502, 503, 504].into_iter().collect()
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            retry_on_timeout: true,
            retry_on_rate_limit: true,
            retry_on_server_error: true,
            retry_on_network_error: false,
            retryable_status_codes: default_retryable_status_codes(),
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Many quick retries: 5 attempts from 500ms, ×1.5, capped at 10s.
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 1.5,
            ..Self::default()
        }
    }

    /// Few patient retries: 2 attempts from 2s, ×3, capped at 60s.
    pub fn conservative() -> Self {
        Self {
            max_attempts: 2,
            initial_delay_ms: 2_000,
            max_delay_ms: 60_000,
            backoff_multiplier: 3.0,
            ..Self::default()
        }
    }

    /// Single attempt, never retry.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Delay before the first retry.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Upper bound for any single delay.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Retries actually allowed (zero when disabled).
    pub fn effective_max_attempts(&self) -> u32 {
        if self.enabled { self.max_attempts } else { 0 }
    }

    /// Delay after failed attempt number `attempt` (1-indexed).
    ///
    /// `min(initial_delay × multiplier^(attempt-1), max_delay)`, which never
    /// decreases as `attempt` grows. Attempt 0 is treated as attempt 1.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_ms = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = delay_ms.min(self.max_delay_ms as f64);
        Duration::from_millis(capped.round() as u64)
    }

    /// The full delay schedule: one entry per allowed retry.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..=self.effective_max_attempts())
            .map(|attempt| self.calculate_delay(attempt))
            .collect()
    }

    /// Whether a failure of this kind may be retried.
    ///
    /// Validation, authentication, malformed-response and cache failures are
    /// never retried. Timeouts follow their switch. Rate limits are retried
    /// when `retry_on_rate_limit` is on or 429 is listed in
    /// `retryable_status_codes`. Any other failure with a status code is
    /// retried if the code is listed, or is a 5xx with `retry_on_server_error`.
    pub fn is_retryable(&self, kind: &RequestErrorKind) -> bool {
        match kind {
            RequestErrorKind::Validation(_)
            | RequestErrorKind::Authentication { .. }
            | RequestErrorKind::MalformedResponse(_)
            | RequestErrorKind::CacheOperation(_) => false,
            RequestErrorKind::Timeout(_) => self.retry_on_timeout,
            RequestErrorKind::RateLimited { .. } => self.is_retryable_status(429),
            RequestErrorKind::Network(_) => self.retry_on_network_error,
            RequestErrorKind::ServerError { status_code, .. }
            | RequestErrorKind::ClientError { status_code, .. } => {
                self.is_retryable_status(*status_code)
            }
        }
    }

    /// Whether a status code alone qualifies for a retry.
    pub fn is_retryable_status(&self, status_code: u16) -> bool {
        self.retryable_status_codes.contains(&status_code)
            || ((500..600).contains(&status_code) && self.retry_on_server_error)
            || (status_code == 429 && self.retry_on_rate_limit)
    }

    /// Check that the schedule is well formed.
    ///
    /// # Errors
    ///
    /// Returns an error unless `initial_delay_ms > 0`,
    /// `max_delay_ms >= initial_delay_ms` and `backoff_multiplier > 1.0`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_delay_ms == 0 {
            return Err(ConfigError::new("retry.initial_delay_ms must be positive"));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ConfigError::new(format!(
                "retry.max_delay_ms ({}) must be at least initial_delay_ms ({})",
                self.max_delay_ms, self.initial_delay_ms
            )));
        }
        if !(self.backoff_multiplier > 1.0) {
            return Err(ConfigError::new(format!(
                "retry.backoff_multiplier must be greater than 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(status_code: u16) -> RequestErrorKind {
        RequestErrorKind::ServerError {
            status_code,
            message: String::new(),
        }
    }

    fn client_error(status_code: u16) -> RequestErrorKind {
        RequestErrorKind::ClientError {
            status_code,
            message: String::new(),
        }
    }

    #[test]
    fn test_first_delay_is_initial_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.calculate_delay(1), policy.initial_delay());
        assert_eq!(policy.calculate_delay(0), policy.initial_delay());
    }

    #[test]
    fn test_delays_grow_then_cap() {
        let policy = RetryPolicy::default()
            .with_initial_delay_ms(100)
            .with_max_delay_ms(1_000)
            .with_backoff_multiplier(3.0);
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(300));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(900));
        assert_eq!(policy.calculate_delay(4), Duration::from_millis(1_000));
        assert_eq!(policy.calculate_delay(u32::MAX), Duration::from_millis(1_000));
    }

    #[test]
    fn test_delays_never_decrease() {
        let policy = RetryPolicy::aggressive();
        let mut previous = Duration::ZERO;
        for attempt in 1..50 {
            let delay = policy.calculate_delay(attempt);
            assert!(delay >= previous);
            previous = delay;
        }
    }

    #[test]
    fn test_schedule_length_matches_retries() {
        assert_eq!(RetryPolicy::default().schedule().len(), 3);
        assert!(RetryPolicy::disabled().schedule().is_empty());
        assert_eq!(RetryPolicy::default().with_max_attempts(0).schedule().len(), 0);
    }

    #[test]
    fn test_switch_controlled_kinds() {
        let policy = RetryPolicy::default();
        let timeout = RequestErrorKind::Timeout("slow".into());
        let limited = RequestErrorKind::RateLimited {
            retry_after_secs: 1,
            limit: None,
            window_secs: None,
        };
        assert!(policy.is_retryable(&timeout));
        assert!(policy.is_retryable(&limited));

        let policy = policy
            .with_retry_on_timeout(false)
            .with_retry_on_rate_limit(false)
            .with_retryable_status_codes(BTreeSet::new());
        assert!(!policy.is_retryable(&timeout));
        assert!(!policy.is_retryable(&limited));
    }

    #[test]
    fn test_listed_429_retries_rate_limits_without_switch() {
        let limited = RequestErrorKind::RateLimited {
            retry_after_secs: 1,
            limit: None,
            window_secs: None,
        };
        let policy = RetryPolicy::default().with_retry_on_rate_limit(false);
        assert!(policy.retryable_status_codes().contains(&429));
        assert!(policy.is_retryable(&limited));
        assert!(policy.is_retryable_status(429));

        let policy = policy.with_retryable_status_codes([503].into_iter().collect());
        assert!(!policy.is_retryable(&limited));

        let policy = policy.with_retry_on_rate_limit(true);
        assert!(policy.is_retryable(&limited));
    }

    #[test]
    fn test_status_code_rules() {
        let policy = RetryPolicy::default()
            .with_retryable_status_codes(BTreeSet::new())
            .with_retry_on_server_error(false);
        assert!(!policy.is_retryable(&server_error(503)));

        let policy = policy.clone().with_retry_on_server_error(true);
        assert!(policy.is_retryable(&server_error(599)));
        assert!(!policy.is_retryable(&client_error(404)));

        let policy = policy.with_retryable_status_codes([408].into_iter().collect());
        assert!(policy.is_retryable(&client_error(408)));
    }

    #[test]
    fn test_never_retried_kinds() {
        let policy = RetryPolicy::aggressive().with_retry_on_network_error(true);
        assert!(!policy.is_retryable(&RequestErrorKind::Validation("bad".into())));
        assert!(!policy.is_retryable(&RequestErrorKind::Authentication {
            status_code: Some(401),
            message: "no key".into(),
        }));
        assert!(!policy.is_retryable(&RequestErrorKind::MalformedResponse("eof".into())));
        assert!(policy.is_retryable(&RequestErrorKind::Network("reset".into())));
        assert!(!RetryPolicy::default().is_retryable(&RequestErrorKind::Network("reset".into())));
    }

    #[test]
    fn test_validate() {
        assert!(RetryPolicy::default().validate().is_ok());
        assert!(RetryPolicy::aggressive().validate().is_ok());
        assert!(RetryPolicy::conservative().validate().is_ok());
        assert!(RetryPolicy::default().with_initial_delay_ms(0).validate().is_err());
        assert!(RetryPolicy::default().with_backoff_multiplier(1.0).validate().is_err());
        assert!(
            RetryPolicy::default()
                .with_initial_delay_ms(5_000)
                .with_max_delay_ms(1_000)
                .validate()
                .is_err()
        );
    }
}
