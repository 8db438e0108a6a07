//! Outcome record for best-effort group changes.
//!
//! Group adds and removes never fail the enclosing operation. Instead each
//! attempt lands in a [`GroupChangeReport`] that callers can log or inspect.

use std::fmt;

use acct_directory::DirectoryResult;

/// A single membership change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupChange {
    /// Account added to the group.
    Added(String),
    /// Account removed from the group.
    Removed(String),
}

impl GroupChange {
    /// Returns the group name.
    #[must_use]
    pub fn group(&self) -> &str {
        match self {
            Self::Added(group) | Self::Removed(group) => group,
        }
    }
}

impl fmt::Display for GroupChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added(group) => write!(f, "+{group}"),
            Self::Removed(group) => write!(f, "-{group}"),
        }
    }
}

/// A change the directory rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedGroupChange {
    /// The attempted change.
    pub change: GroupChange,
    /// Provider failure reason.
    pub reason: String,
}

/// Applied and failed membership changes, in attempt order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupChangeReport {
    /// Changes the directory accepted.
    pub applied: Vec<GroupChange>,
    /// Changes the directory rejected.
    pub failed: Vec<FailedGroupChange>,
}

impl GroupChangeReport {
    /// Records the result of one attempt.
    pub fn record(&mut self, change: GroupChange, result: DirectoryResult<()>) {
        match result {
            Ok(()) => self.applied.push(change),
            Err(err) => self.failed.push(FailedGroupChange {
                change,
                reason: err.to_string(),
            }),
        }
    }

    /// Returns `true` if some attempt failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Returns `true` if nothing was attempted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.failed.is_empty()
    }

    /// Returns the applied changes rendered as `+GROUP` / `-GROUP`.
    #[must_use]
    pub fn applied_summary(&self) -> Vec<String> {
        self.applied.iter().map(ToString::to_string).collect()
    }

    /// Returns the rejected changes rendered the same way.
    #[must_use]
    pub fn failed_summary(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.change.to_string()).collect()
    }
}
