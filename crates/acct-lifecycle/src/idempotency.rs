//! Create idempotency policy.
//!
//! Creating an account that already exists is a successful no-op. This holds
//! both when the pre-create probe finds the account and when the create call
//! loses a race against a concurrent create of the same username.

use acct_directory::DirectoryError;
use acct_model::Account;

/// What the create operation should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDecision {
    /// No such account; create it.
    Proceed,
    /// The account exists; report success without touching it.
    AlreadyExists,
}

/// Decides from the result of the existence probe.
#[must_use]
pub fn decide(probe: Option<&Account>) -> CreateDecision {
    match probe {
        Some(_) => CreateDecision::AlreadyExists,
        None => CreateDecision::Proceed,
    }
}

/// Returns `true` if a failed create means another request created the
/// account first.
#[must_use]
pub fn lost_race(err: &DirectoryError) -> bool {
    err.is_already_exists()
}
