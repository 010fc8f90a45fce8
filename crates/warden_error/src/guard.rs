//! Guard pipeline error types.
//!
//! None of these are fatal to the process. The engine turns each of them into a
//! terminal outcome for the event being processed and moves on.

/// Guard error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GuardErrorKind {
    /// No audit entry of the expected type was found after the settling delay.
    #[display("No audit entry found for {}", operation)]
    MissingCorrelation {
        /// Audit operation that was queried
        operation: String,
    },

    /// The newest audit entry targets a different entity than the event.
    #[display("Audit entry targets {} but event concerns {}", found, expected)]
    MismatchedCorrelation {
        /// Entity id carried by the event
        expected: u64,
        /// Entity id carried by the audit entry (0 when absent)
        found: u64,
    },

    /// The change was made by this guard's own account.
    #[display("Event was caused by the guard itself")]
    SelfAction,

    /// The guard account lacks the capability the action needs.
    #[display("Missing capability '{}' for {}", capability, action)]
    InsufficientCapability {
        /// Action that was attempted
        action: String,
        /// Capability that is missing
        capability: String,
    },

    /// The subject ranks at or above the guard account.
    #[display("Subject rank {} is not below guard rank {}", subject_rank, guard_rank)]
    HierarchyViolation {
        /// Highest role position held by the subject
        subject_rank: u16,
        /// Highest role position held by the guard
        guard_rank: u16,
    },

    /// A remedial API call failed.
    #[display("Revert failed: {}", _0)]
    RevertFailure(String),

    /// A sanction call failed after its preconditions passed.
    #[display("Sanction failed: {}", _0)]
    SanctionFailure(String),

    /// The persistent store could not be reached.
    #[display("Persistence failure: {}", _0)]
    Persistence(String),

    /// Subject is already on the allow-list.
    #[display("Subject {} is already allow-listed", _0)]
    AlreadyListed(u64),

    /// Subject is not on the allow-list.
    #[display("Subject {} is not allow-listed", _0)]
    NotListed(u64),

    /// Subject does not currently hold the quarantine role.
    #[display("Subject {} is not quarantined", _0)]
    NotQuarantined(u64),

    /// Subject is not a member of the guild.
    #[display("Subject {} is not a guild member", _0)]
    NotAMember(u64),

    /// Log channels could not be listed or created.
    #[display("Log channel setup failed: {}", _0)]
    SetupFailure(String),
}

/// Guard error with source location tracking.
///
/// # Examples
///
/// ```
/// use warden_error::{GuardError, GuardErrorKind};
///
/// let err = GuardError::new(GuardErrorKind::SelfAction);
/// assert!(err.to_string().contains("guard itself"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Guard Error: {} at line {} in {}", kind, line, file)]
pub struct GuardError {
    /// The kind of error that occurred
    pub kind: GuardErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GuardError {
    /// Create a new GuardError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GuardErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GuardErrorKind {
        &self.kind
    }
}

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;
