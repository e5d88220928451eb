//! Transport failure types.
//!
//! Transports report what went wrong in wire terms. The pipeline turns these
//! into [`RequestError`](crate::RequestError) values before any retry decision.

/// Raw failure conditions reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TransportErrorKind {
    /// The transport gave up waiting for a response
    #[display("Timed out: {}", _0)]
    Timeout(String),
    /// No response was received (DNS, refused connection, reset, TLS)
    #[display("Connection failed: {}", _0)]
    Connect(String),
    /// The remote side answered with a non-success status
    #[display("HTTP {}: {}", status_code, message)]
    Status {
        /// Status code returned by the remote API
        status_code: u16,
        /// Response body or reason phrase
        message: String,
        /// Upstream retry-after hint in seconds
        retry_after_secs: Option<u64>,
    },
    /// A response arrived but its body could not be read
    #[display("Unreadable response body: {}", _0)]
    Body(String),
}

/// Transport error with location tracking.
///
/// # Examples
///
/// ```
/// use tollgate_error::{TransportError, TransportErrorKind};
///
/// let err = TransportError::new(TransportErrorKind::Connect("connection refused".into()));
/// assert!(format!("{}", err).contains("connection refused"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Transport Error: {} at line {} in {}", kind, line, file)]
pub struct TransportError {
    /// The kind of error that occurred
    pub kind: TransportErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TransportError {
    /// Create a new transport error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TransportErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a status-code failure.
    #[track_caller]
    pub fn status(status_code: u16, message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Status {
            status_code,
            message: message.into(),
            retry_after_secs: None,
        })
    }

    /// Shorthand for a timeout.
    #[track_caller]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout(message.into()))
    }

    /// Shorthand for a connectivity failure.
    #[track_caller]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect(message.into()))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TransportErrorKind {
        &self.kind
    }
}
