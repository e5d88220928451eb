//! Top-level error wrapper types.

use crate::{CacheError, ConfigError, RateLimitError, RequestError, TransportError};

/// Every error a Tollgate crate can produce.
///
/// # Examples
///
/// ```
/// use tollgate_error::{ConfigError, TollgateError};
///
/// let err: TollgateError = ConfigError::new("max_size must be positive").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TollgateErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Rate limiter error
    #[from(RateLimitError)]
    RateLimit(RateLimitError),
    /// Cache operation error
    #[from(CacheError)]
    Cache(CacheError),
    /// Raw transport failure
    #[from(TransportError)]
    Transport(TransportError),
    /// Classified request failure
    #[from(RequestError)]
    Request(RequestError),
}

/// Tollgate error with kind discrimination.
///
/// # Examples
///
/// ```
/// use tollgate_error::{ConfigError, TollgateResult};
///
/// fn might_fail() -> TollgateResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tollgate Error: {}", _0)]
pub struct TollgateError(Box<TollgateErrorKind>);

impl TollgateError {
    /// Create a new error from a kind.
    pub fn new(kind: TollgateErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TollgateErrorKind {
        &self.0
    }
}

impl<T> From<T> for TollgateError
where
    T: Into<TollgateErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tollgate operations.
pub type TollgateResult<T> = std::result::Result<T, TollgateError>;
