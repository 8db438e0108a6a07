//! Directory error types.

use thiserror::Error;

/// Errors surfaced by a directory provider.
///
/// Adapters never swallow failures; every provider rejection reaches the
/// caller as one of these variants.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The account does not exist.
    #[error("Account not found: {username}")]
    NotFound {
        /// Username that was looked up.
        username: String,
    },

    /// An account with this username already exists.
    #[error("Account already exists: {username}")]
    AlreadyExists {
        /// Conflicting username.
        username: String,
    },

    /// The call did not complete in time.
    #[error("Directory call timed out: {operation}")]
    Timeout {
        /// Primitive that timed out.
        operation: &'static str,
    },

    /// The provider rejected or failed the call.
    #[error("Directory call {operation} failed: {code}: {message}")]
    Provider {
        /// Primitive that failed.
        operation: &'static str,
        /// Provider error code.
        code: String,
        /// Provider error message.
        message: String,
    },

    /// The provider answered with data the adapter could not interpret.
    #[error("Invalid directory response: {0}")]
    InvalidResponse(String),

    /// The adapter is misconfigured.
    #[error("Directory configuration error: {0}")]
    Config(String),
}

impl DirectoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(username: impl Into<String>) -> Self {
        Self::NotFound {
            username: username.into(),
        }
    }

    /// Creates an already-exists error.
    #[must_use]
    pub fn already_exists(username: impl Into<String>) -> Self {
        Self::AlreadyExists {
            username: username.into(),
        }
    }

    /// Creates a provider failure.
    #[must_use]
    pub fn provider(
        operation: &'static str,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            operation,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Checks if this is an already-exists error.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Checks if this is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
