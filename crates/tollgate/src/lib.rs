//! Tollgate - client-side request pipeline
//!
//! Tollgate protects a remote API from overload and protects callers from
//! transient failures. Each logical request passes through:
//!
//! - **Response cache**: bounded, per-entry TTL, FIFO eviction
//! - **Rate limiter**: token bucket with burst capacity
//! - **Retry executor**: exponential backoff over classified failures
//!
//! around a caller-supplied [`Transport`].
//!
//! # Architecture
//!
//! Tollgate is organized as a workspace with focused crates:
//!
//! - `tollgate_error` - Error types and failure classification
//! - `tollgate_core` - Operations, request descriptors, telemetry setup
//! - `tollgate_interface` - Transport trait
//! - `tollgate_rate_limit` - Token bucket rate limiting
//! - `tollgate_retry` - Retry policy and executor
//! - `tollgate_cache` - Response cache
//!
//! This crate (`tollgate`) adds the [`RequestPipeline`] and layered
//! [`TollgateConfig`], and re-exports everything for convenience.
//!
//! # Limitations
//!
//! Rate limits and cached responses are process-local and are not persisted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod pipeline;

pub use config::{PresetName, TollgateConfig};
pub use pipeline::RequestPipeline;

pub use tollgate_cache::*;
pub use tollgate_core::*;
pub use tollgate_error::*;
pub use tollgate_interface::*;
pub use tollgate_rate_limit::*;
pub use tollgate_retry::*;
