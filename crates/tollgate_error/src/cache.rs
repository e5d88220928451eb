//! Cache operation error types.

/// Kinds of cache operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CacheErrorKind {
    /// A value could not be converted into its stored form
    #[display("Failed to serialize value for key '{}': {}", key, reason)]
    Serialization {
        /// Cache key being written
        key: String,
        /// Underlying serializer message
        reason: String,
    },
    /// A stored value could not be converted back into the requested type
    #[display("Failed to deserialize cached value for key '{}': {}", key, reason)]
    Deserialization {
        /// Cache key being read
        key: String,
        /// Underlying deserializer message
        reason: String,
    },
}

/// Cache error with location tracking.
///
/// Cache errors are never fatal to a request: the pipeline logs them and
/// falls through to a live call.
///
/// # Examples
///
/// ```
/// use tollgate_error::{CacheError, CacheErrorKind};
///
/// let err = CacheError::new(CacheErrorKind::Deserialization {
///     key: "lookup:abc".to_string(),
///     reason: "missing field `name`".to_string(),
/// });
/// assert!(format!("{}", err).contains("lookup:abc"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Cache Error: {} at line {} in {}", kind, line, file)]
pub struct CacheError {
    /// The kind of error that occurred
    pub kind: CacheErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CacheError {
    /// Create a new cache error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CacheErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &CacheErrorKind {
        &self.kind
    }
}
