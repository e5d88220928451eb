//! Classified request failures.
//!
//! Every failure the pipeline surfaces is normalized into a [`RequestErrorKind`]
//! before any retry decision is made, so retry logic only ever inspects the tag.

use crate::{CacheError, RateLimitError, RateLimitErrorKind, TransportError, TransportErrorKind};
use std::fmt;

/// Semantic category of a failed request.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, strum::IntoStaticStr,
)]
pub enum RequestErrorKind {
    /// The transport gave up waiting for a response
    #[display("Request timed out: {}", _0)]
    Timeout(String),

    /// The caller or the remote API is over its request budget
    #[display("Rate limited, retry after {}s", retry_after_secs)]
    RateLimited {
        /// Seconds to wait before trying again
        retry_after_secs: u64,
        /// Requests allowed per window, when known
        limit: Option<u32>,
        /// Window length in seconds, when known
        window_secs: Option<u64>,
    },

    /// Credentials were missing, invalid or insufficient
    #[display("Authentication failed: {}", message)]
    Authentication {
        /// Status code, when the failure came from a response
        status_code: Option<u16>,
        /// Error message
        message: String,
    },

    /// The remote API failed (5xx)
    #[display("HTTP {} server error: {}", status_code, message)]
    ServerError {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },

    /// The remote API rejected the request (4xx other than auth and rate limit)
    #[display("HTTP {} client error: {}", status_code, message)]
    ClientError {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },

    /// No response was received
    #[display("Network error: {}", _0)]
    Network(String),

    /// A response was received but could not be decoded
    #[display("Malformed response: {}", _0)]
    MalformedResponse(String),

    /// Caller-supplied input was rejected before any network activity
    #[display("Validation failed: {}", _0)]
    Validation(String),

    /// A cache read or write failed
    #[display("Cache operation failed: {}", _0)]
    CacheOperation(String),
}

impl RequestErrorKind {
    /// Classify an HTTP-like status code.
    ///
    /// # Examples
    ///
    /// ```
    /// use tollgate_error::RequestErrorKind;
    ///
    /// assert!(matches!(
    ///     RequestErrorKind::from_status(503, "unavailable", None),
    ///     RequestErrorKind::ServerError { status_code: 503, .. }
    /// ));
    /// assert!(matches!(
    ///     RequestErrorKind::from_status(429, "slow down", Some(7)),
    ///     RequestErrorKind::RateLimited { retry_after_secs: 7, .. }
    /// ));
    /// ```
    pub fn from_status(
        status_code: u16,
        message: impl Into<String>,
        retry_after_secs: Option<u64>,
    ) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => RequestErrorKind::Authentication {
                status_code: Some(status_code),
                message,
            },
            429 => RequestErrorKind::RateLimited {
                retry_after_secs: retry_after_secs.unwrap_or(0),
                limit: None,
                window_secs: None,
            },
            500..=599 => RequestErrorKind::ServerError {
                status_code,
                message,
            },
            400..=499 => RequestErrorKind::ClientError {
                status_code,
                message,
            },
            _ => RequestErrorKind::MalformedResponse(format!(
                "unexpected status {}: {}",
                status_code, message
            )),
        }
    }

    /// Status code associated with this failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RequestErrorKind::RateLimited { .. } => Some(429),
            RequestErrorKind::Authentication { status_code, .. } => *status_code,
            RequestErrorKind::ServerError { status_code, .. }
            | RequestErrorKind::ClientError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Short stable name of the category, for logs and metrics labels.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// A classified request failure with endpoint and attempt context.
///
/// # Examples
///
/// ```
/// use tollgate_error::{RequestError, RequestErrorKind};
///
/// let err = RequestError::new(RequestErrorKind::from_status(503, "unavailable", None))
///     .with_endpoint("registry.lookup")
///     .with_attempts(3);
///
/// assert_eq!(err.status_code(), Some(503));
/// assert_eq!(err.endpoint(), Some("registry.lookup"));
/// assert_eq!(err.attempts(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct RequestError {
    kind: RequestErrorKind,
    endpoint: Option<String>,
    attempts: u32,
    source: Option<TransportError>,
    line: u32,
    file: &'static str,
}

impl RequestError {
    /// Create a new request error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RequestErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            endpoint: None,
            attempts: 0,
            source: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a validation failure.
    #[track_caller]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RequestErrorKind::Validation(message.into()))
    }

    /// Attach the endpoint identity.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Record how many transport attempts were made.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RequestErrorKind {
        &self.kind
    }

    /// Endpoint that failed, if known.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Number of transport attempts made before giving up (0 if none).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Status code associated with this failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.kind.status_code()
    }

    /// Suggested wait before retrying, for rate-limited failures.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match &self.kind {
            RequestErrorKind::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// Suggested wait before retrying, as a duration.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        self.retry_after_secs().map(std::time::Duration::from_secs)
    }

    /// True for `RateLimited` failures.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, RequestErrorKind::RateLimited { .. })
    }

    /// True for `Timeout` failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, RequestErrorKind::Timeout(_))
    }

    /// True for `Authentication` failures.
    pub fn is_authentication(&self) -> bool {
        matches!(self.kind, RequestErrorKind::Authentication { .. })
    }

    /// The transport failure this error was classified from, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        self.source.as_ref()
    }

    /// Line number where error was created.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// File where error was created.
    pub fn file(&self) -> &'static str {
        self.file
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request Error: {}", self.kind)?;
        if let Some(endpoint) = &self.endpoint {
            write!(f, " [endpoint: {}]", endpoint)?;
        }
        if self.attempts > 0 {
            write!(f, " [attempts: {}]", self.attempts)?;
        }
        write!(f, " at line {} in {}", self.line, self.file)
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

impl From<CacheError> for RequestError {
    #[track_caller]
    fn from(err: CacheError) -> Self {
        Self::new(RequestErrorKind::CacheOperation(err.kind.to_string()))
    }
}

impl From<TransportError> for RequestError {
    #[track_caller]
    fn from(err: TransportError) -> Self {
        let kind = match err.kind.clone() {
            TransportErrorKind::Timeout(message) => RequestErrorKind::Timeout(message),
            TransportErrorKind::Connect(message) => RequestErrorKind::Network(message),
            TransportErrorKind::Status {
                status_code,
                message,
                retry_after_secs,
            } => RequestErrorKind::from_status(status_code, message, retry_after_secs),
            TransportErrorKind::Body(message) => RequestErrorKind::MalformedResponse(message),
        };
        let mut classified = Self::new(kind);
        classified.source = Some(err);
        classified
    }
}

impl From<RateLimitError> for RequestError {
    #[track_caller]
    fn from(err: RateLimitError) -> Self {
        let kind = match err.kind {
            RateLimitErrorKind::LimitExceeded {
                retry_after_secs,
                limit,
                window_secs,
            } => RequestErrorKind::RateLimited {
                retry_after_secs,
                limit: Some(limit),
                window_secs: Some(window_secs),
            },
            RateLimitErrorKind::InvalidTokenCount(count) => RequestErrorKind::Validation(
                format!("token count must be at least 1, got {}", count),
            ),
            RateLimitErrorKind::ExceedsCapacity {
                requested,
                capacity,
            } => RequestErrorKind::Validation(format!(
                "requested {} tokens but bucket capacity is {}",
                requested, capacity
            )),
        };
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            RequestErrorKind::from_status(401, "no key", None),
            RequestErrorKind::Authentication {
                status_code: Some(401),
                ..
            }
        ));
        assert!(matches!(
            RequestErrorKind::from_status(403, "forbidden", None),
            RequestErrorKind::Authentication { .. }
        ));
        assert!(matches!(
            RequestErrorKind::from_status(404, "missing", None),
            RequestErrorKind::ClientError {
                status_code: 404,
                ..
            }
        ));
        assert!(matches!(
            RequestErrorKind::from_status(502, "bad gateway", None),
            RequestErrorKind::ServerError {
                status_code: 502,
                ..
            }
        ));
        assert!(matches!(
            RequestErrorKind::from_status(304, "not modified", None),
            RequestErrorKind::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_transport_timeout_becomes_timeout() {
        let err: RequestError = TransportError::timeout("30s elapsed").into();
        assert!(err.is_timeout());
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_transport_connect_becomes_network() {
        let err: RequestError = TransportError::connect("refused").into();
        assert!(matches!(err.kind(), RequestErrorKind::Network(_)));
    }

    #[test]
    fn test_cache_failure_becomes_cache_operation() {
        let err: RequestError = CacheError::new(crate::CacheErrorKind::Deserialization {
            key: "lookup:abc".to_string(),
            reason: "missing field `name`".to_string(),
        })
        .into();
        match err.kind() {
            RequestErrorKind::CacheOperation(message) => assert!(message.contains("lookup:abc")),
            other => panic!("Expected CacheOperation, got {other:?}"),
        }
        assert_eq!(err.kind().name(), "CacheOperation");
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_transport_failure_is_kept_as_source() {
        use std::error::Error;

        let err: RequestError = TransportError::connect("refused").into();
        let source = err.source().expect("transport error kept as source");
        assert!(source.to_string().contains("refused"));
        assert_eq!(
            err.transport_error().map(|e| &e.kind),
            Some(&TransportErrorKind::Connect("refused".to_string()))
        );

        let unclassified = RequestError::validation("empty number");
        assert!(unclassified.source().is_none());
    }

    #[test]
    fn test_transport_429_carries_retry_after() {
        let err: RequestError = TransportError::new(TransportErrorKind::Status {
            status_code: 429,
            message: "too many".to_string(),
            retry_after_secs: Some(12),
        })
        .into();
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after_secs(), Some(12));
        assert_eq!(err.status_code(), Some(429));
    }

    #[test]
    fn test_rate_limit_error_conversion() {
        let err: RequestError = RateLimitError::new(RateLimitErrorKind::LimitExceeded {
            retry_after_secs: 3,
            limit: 60,
            window_secs: 60,
        })
        .into();
        assert_eq!(
            err.kind(),
            &RequestErrorKind::RateLimited {
                retry_after_secs: 3,
                limit: Some(60),
                window_secs: Some(60),
            }
        );

        let err: RequestError =
            RateLimitError::new(RateLimitErrorKind::InvalidTokenCount(0)).into();
        assert!(matches!(err.kind(), RequestErrorKind::Validation(_)));
    }

    #[test]
    fn test_display_includes_context() {
        let err = RequestError::new(RequestErrorKind::from_status(500, "boom", None))
            .with_endpoint("company.lookup")
            .with_attempts(4);
        let rendered = err.to_string();
        assert!(rendered.contains("HTTP 500 server error: boom"));
        assert!(rendered.contains("company.lookup"));
        assert!(rendered.contains("attempts: 4"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(RequestErrorKind::Timeout("x".into()).name(), "Timeout");
        assert_eq!(
            RequestErrorKind::from_status(429, "", None).name(),
            "RateLimited"
        );
    }
}
