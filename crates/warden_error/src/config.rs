//! Configuration error types.

use std::fmt;
use std::path::{Path, PathBuf};

/// A guard configuration that could not be loaded, validated or persisted.
///
/// Carries the offending `warden.toml` when one is involved, so errors from
/// layered loading and from `punishment set` name the file to fix.
///
/// # Examples
///
/// ```
/// use warden_error::ConfigError;
///
/// let err = ConfigError::new("guild_id must be set").with_path("/etc/warden/warden.toml");
/// assert!(err.to_string().contains("/etc/warden/warden.toml"));
/// assert!(err.message.contains("guild_id"));
/// ```
#[derive(Debug, Clone, derive_more::Error)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Configuration file involved, if any
    pub path: Option<PathBuf>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            path: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Attach the configuration file the error concerns.
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration Error: {}", self.message)?;
        if let Some(path) = &self.path {
            write!(f, " ({})", path.display())?;
        }
        write!(f, " at line {} in {}", self.line, self.file)
    }
}
