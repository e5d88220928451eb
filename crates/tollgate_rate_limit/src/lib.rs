//! Token bucket rate limiting.
//!
//! This crate provides the admission control stage of the Tollgate pipeline.
//! A [`RateLimiter`] allows bursts up to its capacity while holding the
//! long-run request rate to `max_requests / window_seconds`.
//!
//! Limits are process-local: there is no coordination between processes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod limiter;
mod stats;

pub use config::RateLimitConfig;
pub use limiter::RateLimiter;
pub use stats::RateLimitStats;
