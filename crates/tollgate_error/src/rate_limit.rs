//! Rate limiter error types.

/// Error kinds for rate limiting operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// Not enough tokens and the caller asked not to wait.
    #[display(
        "Rate limit exceeded, retry after {}s (limit: {} per {}s)",
        retry_after_secs,
        limit,
        window_secs
    )]
    LimitExceeded {
        /// Seconds until enough tokens are available, rounded up
        retry_after_secs: u64,
        /// Requests allowed per window
        limit: u32,
        /// Window length in seconds
        window_secs: u64,
    },
    /// Token requests must be positive.
    #[display("Invalid token count: {} (must be at least 1)", _0)]
    InvalidTokenCount(u32),
    /// More tokens were requested than the bucket can ever hold.
    #[display("Requested {} tokens but bucket capacity is {}", requested, capacity)]
    ExceedsCapacity {
        /// Tokens requested
        requested: u32,
        /// Bucket capacity
        capacity: u32,
    },
}

/// Rate limiting error with location tracking.
///
/// # Examples
///
/// ```
/// use tollgate_error::{RateLimitError, RateLimitErrorKind};
///
/// let err = RateLimitError::new(RateLimitErrorKind::InvalidTokenCount(0));
/// assert!(format!("{}", err).contains("Invalid token count"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    /// The kind of error that occurred
    pub kind: RateLimitErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }
}
