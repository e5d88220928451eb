//! Exponential backoff retries.
//!
//! A [`RetryPolicy`] decides which failures deserve another attempt and how
//! long to wait before each one. A [`RetryExecutor`] runs an async operation
//! under that policy.
//!
//! Retry decisions look only at the [`RequestErrorKind`](tollgate_error::RequestErrorKind)
//! of a failure, so transports must classify their errors before they reach
//! the executor.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod executor;
mod policy;

pub use executor::RetryExecutor;
pub use policy::RetryPolicy;
