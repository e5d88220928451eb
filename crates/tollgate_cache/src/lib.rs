//! Bounded TTL response caching.
//!
//! [`ResponseCache`] holds successful responses as JSON with per-entry expiry
//! and FIFO eviction. [`cache_key`] derives stable keys from an operation name
//! and its parameters.
//!
//! The cache lives in process memory and is lost on restart.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod key;
mod stats;

pub use cache::ResponseCache;
pub use config::{CacheConfig, CacheConfigBuilder, CacheConfigBuilderError, MAX_TTL_SECS};
pub use key::cache_key;
pub use stats::CacheStats;
