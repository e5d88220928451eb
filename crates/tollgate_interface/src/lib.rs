//! Trait definitions for the Tollgate request pipeline.
//!
//! The pipeline is transport-agnostic: anything implementing [`Transport`]
//! can be guarded by rate limiting, retries and caching.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::Transport;
pub use types::RawResponse;
