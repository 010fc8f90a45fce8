//! Top-level error wrapper types.

use crate::{ConfigError, DatabaseError, GuardError, PlatformError};

/// Every error the workspace can surface to a caller.
///
/// # Examples
///
/// ```
/// use warden_error::{ConfigError, WardenError};
///
/// let err: WardenError = ConfigError::new("bad guild id").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum WardenErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Database error
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Chat platform error
    #[from(PlatformError)]
    Platform(PlatformError),
    /// Guard pipeline error
    #[from(GuardError)]
    Guard(GuardError),
}

/// Warden error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Warden Error: {}", _0)]
pub struct WardenError(Box<WardenErrorKind>);

impl WardenError {
    /// Create a new error from a kind.
    pub fn new(kind: WardenErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &WardenErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to WardenErrorKind
impl<T> From<T> for WardenError
where
    T: Into<WardenErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Warden operations.
pub type WardenResult<T> = std::result::Result<T, WardenError>;
