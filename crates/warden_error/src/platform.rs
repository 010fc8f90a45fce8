//! Errors raised by the chat platform (gateway, REST API, audit log).

/// Platform error conditions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum PlatformErrorKind {
    /// REST call failed (HTTP error, rate limit, malformed response).
    #[display("API error: {_0}")]
    Api(String),

    /// The platform rejected the call for lack of permission.
    #[display("Missing permission: {_0}")]
    MissingPermission(String),

    /// Requested entity does not exist (or no longer exists).
    #[display("Not found: {_0}")]
    NotFound(String),

    /// Gateway connection failed.
    #[display("Gateway error: {_0}")]
    Gateway(String),

    /// Bot token is invalid or expired.
    #[display("Invalid or expired bot token")]
    InvalidToken,
}

/// Platform error with source location tracking.
///
/// # Examples
///
/// ```
/// use warden_error::{PlatformError, PlatformErrorKind};
///
/// let err = PlatformError::new(PlatformErrorKind::NotFound("channel 42".into()));
/// assert!(err.to_string().contains("channel 42"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Platform Error: {} at line {} in {}", kind, line, file)]
pub struct PlatformError {
    /// The kind of error that occurred
    pub kind: PlatformErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PlatformError {
    /// Create a new PlatformError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PlatformErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for an [`PlatformErrorKind::Api`] error.
    #[track_caller]
    pub fn api(message: impl Into<String>) -> Self {
        Self::new(PlatformErrorKind::Api(message.into()))
    }
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
