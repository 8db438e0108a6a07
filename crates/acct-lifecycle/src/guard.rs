//! Authorization guard for account deletion.
//!
//! The decision is a pure function of the caller and the target account.
//! Callers must feed it the target's groups as currently stored by the
//! directory, not as claimed by the request.

use std::fmt;

use acct_model::{Account, Caller};

/// Why a deletion was refused. Rules are evaluated in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    /// No target username supplied.
    MissingTarget,
    /// The target is the caller.
    CannotDeleteSelf,
    /// The target belongs to the administrators group.
    TargetIsAdmin,
}

impl DenyReason {
    /// Machine-readable reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingTarget => "missing_target",
            Self::CannotDeleteSelf => "cannot_delete_self",
            Self::TargetIsAdmin => "target_is_admin",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guard decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDecision {
    /// Deletion may proceed.
    Allowed,
    /// Deletion is refused.
    Denied(DenyReason),
}

impl DeleteDecision {
    /// Returns `true` if deletion may proceed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Decides whether `caller` may delete `target`.
#[must_use]
pub fn can_delete(caller: &Caller, target: Option<&Account>) -> DeleteDecision {
    let Some(target) = target.filter(|t| !t.username.trim().is_empty()) else {
        return DeleteDecision::Denied(DenyReason::MissingTarget);
    };
    if caller.is(&target.username) {
        return DeleteDecision::Denied(DenyReason::CannotDeleteSelf);
    }
    if target.is_admin() {
        return DeleteDecision::Denied(DenyReason::TargetIsAdmin);
    }
    DeleteDecision::Allowed
}
