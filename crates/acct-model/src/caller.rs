//! Authenticated caller identity.

use std::collections::BTreeSet;

use crate::account::normalize_username;
use crate::group::ADMINS_GROUP;

/// The identity on whose behalf an admin operation runs.
///
/// Derived from a verified bearer token; never supplied in a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Normalized username (email) of the caller.
    pub username: String,
    /// Token subject identifier.
    pub subject: String,
    /// Groups asserted by the token.
    pub groups: BTreeSet<String>,
}

impl Caller {
    /// Creates a caller, normalizing the username.
    #[must_use]
    pub fn new(username: &str, subject: impl Into<String>) -> Self {
        Self {
            username: normalize_username(username),
            subject: subject.into(),
            groups: BTreeSet::new(),
        }
    }

    /// Adds group memberships.
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Returns `true` if the caller is in the administrators group.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.groups.contains(ADMINS_GROUP)
    }

    /// Returns `true` if `username` designates the caller.
    ///
    /// Both the username and the token subject count as the caller's identity.
    #[must_use]
    pub fn is(&self, username: &str) -> bool {
        let candidate = normalize_username(username);
        candidate == self.username
            || (!self.subject.is_empty() && candidate == self.subject.to_lowercase())
    }
}
