//! Token bucket rate limiter.
//!
//! The bucket refills lazily: every operation first credits
//! `elapsed × refill_rate` tokens (capped at capacity), then checks and debits
//! under the same lock, so two concurrent callers can never both spend the
//! last token.

use crate::{RateLimitConfig, RateLimitStats};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tollgate_error::{ConfigError, RateLimitError, RateLimitErrorKind};
use tracing::{debug, instrument, warn};

/// Token bucket state.
#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, refill_rate: f64) -> Self {
        Self {
            capacity,
            tokens: capacity,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    /// Credit tokens for the time elapsed since the last refill.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed_secs = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed_secs * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Debit `needed` tokens, or return how long until they are available.
    fn try_consume(&mut self, needed: f64) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= needed {
            self.tokens -= needed;
            Ok(())
        } else {
            let secs_to_wait = (needed - self.tokens) / self.refill_rate;
            Err(Duration::try_from_secs_f64(secs_to_wait).unwrap_or(Duration::MAX))
        }
    }

    fn available(&mut self) -> u32 {
        self.refill();
        self.tokens.floor() as u32
    }

    fn reset(&mut self) {
        self.tokens = self.capacity;
        self.last_refill = Instant::now();
    }
}

/// Process-local token bucket rate limiter.
///
/// One limiter is shared (behind an `Arc`) by every request a client issues.
/// All state lives behind an internal mutex that is never held across an
/// `.await`: a blocked caller sleeps without the lock, so other tasks keep
/// running and can take tokens as they refill.
///
/// Limits are per process. Several processes talking to the same API each
/// keep their own bucket.
///
/// # Example
///
/// ```
/// use tollgate_rate_limit::{RateLimitConfig, RateLimiter};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = RateLimiter::new(RateLimitConfig::default().with_burst_size(2))?;
///
/// assert!(limiter.try_acquire(1));
/// assert!(limiter.try_acquire(1));
/// assert!(!limiter.try_acquire(1));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// Create a limiter with a full bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is enabled but cannot refill.
    pub fn new(config: RateLimitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            enabled = config.enabled(),
            max_requests = config.max_requests(),
            window_seconds = config.window_seconds(),
            burst_size = config.burst_size(),
            "Creating new RateLimiter"
        );
        let bucket = TokenBucket::new(*config.burst_size() as f64, config.refill_rate());
        Ok(Self {
            config,
            bucket: Mutex::new(bucket),
        })
    }

    /// A limiter that admits everything.
    pub fn disabled() -> Self {
        let config = RateLimitConfig::disabled();
        let bucket = TokenBucket::new(*config.burst_size() as f64, config.refill_rate());
        Self {
            config,
            bucket: Mutex::new(bucket),
        }
    }

    /// The configuration this limiter enforces.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Whether limits are enforced.
    pub fn is_enabled(&self) -> bool {
        *self.config.enabled()
    }

    fn bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_valid(&self, tokens_needed: u32) -> Result<(), RateLimitError> {
        if tokens_needed == 0 {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidTokenCount(
                tokens_needed,
            )));
        }
        let capacity = *self.config.burst_size();
        if tokens_needed > capacity {
            return Err(RateLimitError::new(RateLimitErrorKind::ExceedsCapacity {
                requested: tokens_needed,
                capacity,
            }));
        }
        Ok(())
    }

    fn exceeded(&self, wait: Duration) -> RateLimitError {
        RateLimitError::new(RateLimitErrorKind::LimitExceeded {
            retry_after_secs: wait.as_secs_f64().ceil() as u64,
            limit: *self.config.max_requests(),
            window_secs: *self.config.window_seconds(),
        })
    }

    /// Take `tokens_needed` tokens, waiting for them if `allow_blocking`.
    ///
    /// When blocking, the caller sleeps for exactly the time the bucket needs
    /// to refill the shortfall and then checks again, repeating until it wins
    /// the tokens. When not blocking, a shortfall fails immediately with
    /// `LimitExceeded` carrying the wait rounded up to whole seconds.
    ///
    /// # Errors
    ///
    /// - `InvalidTokenCount` if `tokens_needed` is zero
    /// - `ExceedsCapacity` if the bucket can never hold that many tokens
    /// - `LimitExceeded` if tokens are short and blocking is not allowed
    #[instrument(skip(self), fields(enabled = self.is_enabled()))]
    pub async fn acquire(
        &self,
        tokens_needed: u32,
        allow_blocking: bool,
    ) -> Result<(), RateLimitError> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.ensure_valid(tokens_needed)?;

        loop {
            let attempt = self.bucket().try_consume(tokens_needed as f64);
            let wait = match attempt {
                Ok(()) => {
                    debug!("Rate limit tokens acquired");
                    return Ok(());
                }
                Err(wait) => wait,
            };

            if !allow_blocking {
                warn!(wait_ms = wait.as_millis() as u64, "Rate limit exceeded");
                return Err(self.exceeded(wait));
            }

            debug!(wait_ms = wait.as_millis() as u64, "Waiting for rate limit tokens");
            tokio::time::sleep(wait).await;
        }
    }

    /// Non-blocking acquisition that reports the failure.
    ///
    /// # Errors
    ///
    /// Same as [`acquire`](Self::acquire) with `allow_blocking = false`.
    pub fn check(&self, tokens_needed: u32) -> Result<(), RateLimitError> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.ensure_valid(tokens_needed)?;

        let result = self.bucket().try_consume(tokens_needed as f64);
        result.map_err(|wait| {
            debug!(wait_ms = wait.as_millis() as u64, "Rate limit check failed");
            self.exceeded(wait)
        })
    }

    /// Non-blocking acquisition degraded to a boolean.
    pub fn try_acquire(&self, tokens_needed: u32) -> bool {
        self.check(tokens_needed).is_ok()
    }

    /// Whole tokens available right now.
    ///
    /// A snapshot: a concurrent caller may spend them before you do.
    pub fn available_tokens(&self) -> u32 {
        if !self.is_enabled() {
            return *self.config.burst_size();
        }
        self.bucket().available()
    }

    /// Refill the bucket to capacity and restart the refill clock.
    pub fn reset(&self) {
        self.bucket().reset();
        debug!("Rate limiter reset to full capacity");
    }

    /// Snapshot of limiter state.
    pub fn stats(&self) -> RateLimitStats {
        let available_tokens = self.available_tokens();
        let burst_size = *self.config.burst_size();
        let refill_rate = self.config.refill_rate();
        let utilization_percentage = if self.is_enabled() && burst_size > 0 {
            let used = burst_size.saturating_sub(available_tokens) as f64;
            round2(used / burst_size as f64 * 100.0)
        } else {
            0.0
        };

        RateLimitStats {
            enabled: self.is_enabled(),
            available_tokens,
            burst_size,
            refill_rate,
            max_requests: *self.config.max_requests(),
            window_seconds: *self.config.window_seconds(),
            avg_requests_per_second: round2(refill_rate),
            utilization_percentage,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
