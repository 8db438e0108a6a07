//! Lifecycle error types.

use acct_directory::DirectoryError;
use thiserror::Error;

use crate::report::GroupChangeReport;

/// Caller faults, detected before any directory call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Email does not have an address shape.
    #[error("invalid email")]
    InvalidEmail,
    /// Both enable and disable were requested.
    #[error("enable and disable are mutually exclusive")]
    ConflictingEnableDisable,
    /// No username was supplied.
    #[error("missing username")]
    MissingUsername,
}

impl ValidationError {
    /// Machine-readable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidEmail => "invalid_email",
            Self::ConflictingEnableDisable => "conflicting_enable_disable",
            Self::MissingUsername => "missing_username",
        }
    }

    /// Message shown to admin users.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidEmail => "Email invalide",
            Self::ConflictingEnableDisable => "Activer et désactiver ne peuvent pas être combinés",
            Self::MissingUsername => "Nom d'utilisateur manquant",
        }
    }
}

/// Errors produced by lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Invalid request.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Target account does not exist.
    #[error("Account not found: {username}")]
    NotFound {
        /// Normalized username.
        username: String,
    },

    /// The primary directory call of the operation failed.
    #[error("Directory call {operation} failed: {source}")]
    Directory {
        /// Primitive that failed.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: DirectoryError,
    },

    /// The directory refused to delete the account, or its current groups
    /// could not be checked.
    #[error("Delete failed: {0}")]
    DeleteFailed(#[source] DirectoryError),

    /// The operation was cancelled before it completed.
    ///
    /// `applied` lists the group changes that reached the directory first.
    #[error("Operation cancelled")]
    Cancelled {
        /// Account created before cancellation, if any.
        created: Option<String>,
        /// Changes applied before cancellation.
        applied: GroupChangeReport,
    },
}

impl LifecycleError {
    /// Creates a directory failure.
    #[must_use]
    pub const fn directory(operation: &'static str, source: DirectoryError) -> Self {
        Self::Directory { operation, source }
    }

    /// Creates a cancellation with nothing applied.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::Cancelled {
            created: None,
            applied: GroupChangeReport::default(),
        }
    }

    /// Checks if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Checks if the operation was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
