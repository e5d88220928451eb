//! Retry execution on top of `tokio-retry2`.

use crate::RetryPolicy;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry2::{Retry, RetryError, strategy::jitter_range};
use tollgate_error::{ConfigError, RequestError};
use tracing::{debug, instrument, warn};

/// Runs fallible async operations under a [`RetryPolicy`].
///
/// Each call to [`execute`](Self::execute) is independent: the executor holds
/// no state between calls and can be shared freely.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
        }
    }
}

impl RetryExecutor {
    /// Create an executor, validating the policy when retries are enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the backoff schedule is malformed.
    pub fn new(policy: RetryPolicy) -> Result<Self, ConfigError> {
        if *policy.enabled() {
            policy.validate()?;
        }
        Ok(Self { policy })
    }

    /// Executor that runs each operation exactly once.
    pub fn disabled() -> Self {
        Self {
            policy: RetryPolicy::disabled(),
        }
    }

    /// Get the policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn delays(&self) -> Vec<Duration> {
        let schedule = self.policy.schedule();
        if *self.policy.jitter() {
            // Full jitter: uniform in [0, delay), never above the cap.
            let full_jitter = jitter_range(0.0, 1.0);
            let cap = self.policy.max_delay();
            schedule
                .into_iter()
                .map(|delay| full_jitter(delay).min(cap))
                .collect()
        } else {
            schedule
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the retry budget is spent.
    ///
    /// `operation` is invoked at most `max_attempts + 1` times. Between
    /// attempts the executor sleeps for the policy's backoff delay. The
    /// returned error is the last one observed, annotated with the number of
    /// attempts made.
    ///
    /// # Errors
    ///
    /// Returns the final [`RequestError`] if no attempt succeeded.
    #[instrument(skip(self, operation), fields(max_attempts = self.policy.effective_max_attempts()))]
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let policy = &self.policy;
        let attempts = AtomicU32::new(0);
        let max_attempts = policy.effective_max_attempts();

        let result = Retry::spawn(self.delays(), || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let pending = operation();
            async move {
                match pending.await {
                    Ok(value) => {
                        if attempt > 1 {
                            debug!(attempt, "Request succeeded after retry");
                        }
                        Ok(value)
                    }
                    Err(e) if policy.is_retryable(e.kind()) && attempt <= max_attempts => {
                        warn!(
                            attempt,
                            max_attempts,
                            error_kind = e.kind().name(),
                            error = %e.kind(),
                            next_delay_ms = policy.calculate_delay(attempt).as_millis() as u64,
                            "Retryable failure, backing off"
                        );
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => {
                        debug!(
                            attempt,
                            error_kind = e.kind().name(),
                            "Giving up on request"
                        );
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await;

        result.map_err(|e| e.with_attempts(attempts.load(Ordering::SeqCst)))
    }
}
