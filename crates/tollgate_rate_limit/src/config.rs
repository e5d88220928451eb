//! Rate limit configuration and presets.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tollgate_error::ConfigError;

/// Configuration for a token bucket rate limiter.
///
/// `max_requests` per `window_seconds` sets the long-run refill rate;
/// `burst_size` is the bucket capacity.
///
/// # Example
///
/// ```toml
/// [rate_limit]
/// enabled = true
/// max_requests = 600
/// window_seconds = 300
/// burst_size = 10
/// block_on_limit = true
/// ```
///
/// ```
/// use tollgate_rate_limit::RateLimitConfig;
///
/// let config = RateLimitConfig::strict().with_burst_size(2);
/// assert_eq!(*config.burst_size(), 2);
/// assert_eq!(config.refill_rate(), 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RateLimitConfig {
    /// Whether rate limiting is enforced at all
    #[serde(default = "default_enabled")]
    enabled: bool,

    /// Requests allowed per window
    #[serde(default = "default_max_requests")]
    max_requests: u32,

    /// Window length in seconds
    #[serde(default = "default_window_seconds")]
    window_seconds: u64,

    /// Bucket capacity (largest burst admitted at once)
    #[serde(default = "default_burst_size")]
    burst_size: u32,

    /// Wait for tokens instead of failing with `RateLimited`
    #[serde(default = "default_block_on_limit")]
    block_on_limit: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_max_requests() -> u32 {
    60
}

fn default_window_seconds() -> u64 {
    60
}

fn default_burst_size() -> u32 {
    10
}

fn default_block_on_limit() -> bool {
    true
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
            burst_size: default_burst_size(),
            block_on_limit: default_block_on_limit(),
        }
    }
}

impl RateLimitConfig {
    /// 30 requests per minute, bursts of 5.
    pub fn strict() -> Self {
        Self {
            max_requests: 30,
            window_seconds: 60,
            burst_size: 5,
            ..Self::default()
        }
    }

    /// 120 requests per minute, bursts of 20.
    pub fn lenient() -> Self {
        Self {
            max_requests: 120,
            window_seconds: 60,
            burst_size: 20,
            ..Self::default()
        }
    }

    /// No rate limiting.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Tokens added per second.
    pub fn refill_rate(&self) -> f64 {
        if self.window_seconds == 0 {
            return 0.0;
        }
        self.max_requests as f64 / self.window_seconds as f64
    }

    /// Check that an enabled limiter can make progress.
    ///
    /// # Errors
    ///
    /// Returns an error if any limit is zero while rate limiting is enabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.max_requests == 0 {
            return Err(ConfigError::new("rate_limit.max_requests must be positive"));
        }
        if self.window_seconds == 0 {
            return Err(ConfigError::new("rate_limit.window_seconds must be positive"));
        }
        if self.burst_size == 0 {
            return Err(ConfigError::new("rate_limit.burst_size must be positive"));
        }
        Ok(())
    }
}
