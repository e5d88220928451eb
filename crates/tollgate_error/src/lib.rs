//! Error types for the Tollgate request pipeline.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! [`RequestError`] is the classified failure surfaced to callers of the
//! pipeline. Raw [`TransportError`]s and [`RateLimitError`]s convert into it.
//!
//! # Examples
//!
//! ```
//! use tollgate_error::{RequestError, TransportError};
//!
//! let err: RequestError = TransportError::status(503, "Service Unavailable").into();
//! assert_eq!(err.status_code(), Some(503));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod rate_limit;
mod request;
mod transport;

pub use cache::{CacheError, CacheErrorKind};
pub use config::ConfigError;
pub use error::{TollgateError, TollgateErrorKind, TollgateResult};
pub use rate_limit::{RateLimitError, RateLimitErrorKind};
pub use request::{RequestError, RequestErrorKind};
pub use transport::{TransportError, TransportErrorKind};
