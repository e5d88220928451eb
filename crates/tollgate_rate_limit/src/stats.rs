//! Rate limiter statistics.

use serde::{Deserialize, Serialize};

/// Point-in-time view of a rate limiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitStats {
    /// Whether limits are enforced
    pub enabled: bool,
    /// Whole tokens currently in the bucket
    pub available_tokens: u32,
    /// Bucket capacity
    pub burst_size: u32,
    /// Tokens added per second
    pub refill_rate: f64,
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_seconds: u64,
    /// Long-run admitted request rate
    pub avg_requests_per_second: f64,
    /// Share of the bucket currently spent, 0–100
    pub utilization_percentage: f64,
}
