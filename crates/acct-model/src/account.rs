//! Account domain model.
//!
//! An account is one user record held by the directory provider. In this
//! system the username is always the normalized email address.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::group::ADMINS_GROUP;

/// Attribute holding the account email.
pub const ATTR_EMAIL: &str = "email";
/// Attribute flagging the email as verified.
pub const ATTR_EMAIL_VERIFIED: &str = "email_verified";
/// Attribute holding the given name.
pub const ATTR_GIVEN_NAME: &str = "given_name";
/// Attribute holding the family name.
pub const ATTR_FAMILY_NAME: &str = "family_name";

/// Normalizes a raw email or username into the canonical username form.
///
/// Usernames are trimmed and lower-cased so that `" Jane.Doe@Example.com "`
/// and `"jane.doe@example.com"` address the same account.
#[must_use]
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Provider lifecycle state of an account.
///
/// The service never transitions this value; it is surfaced read-only.
/// Unrecognized provider values are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountStatus {
    /// Account created but not yet confirmed.
    Unconfirmed,
    /// Account confirmed.
    Confirmed,
    /// Account must change its temporary password at next sign-in.
    ForceChangePassword,
    /// Password reset required.
    ResetRequired,
    /// Account archived by the provider.
    Archived,
    /// Account flagged as compromised.
    Compromised,
    /// Account federated from an external provider.
    ExternalProvider,
    /// Status not reported.
    #[default]
    Unknown,
    /// Any other provider value.
    Other(String),
}

impl AccountStatus {
    /// Returns the provider wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unconfirmed => "UNCONFIRMED",
            Self::Confirmed => "CONFIRMED",
            Self::ForceChangePassword => "FORCE_CHANGE_PASSWORD",
            Self::ResetRequired => "RESET_REQUIRED",
            Self::Archived => "ARCHIVED",
            Self::Compromised => "COMPROMISED",
            Self::ExternalProvider => "EXTERNAL_PROVIDER",
            Self::Unknown => "UNKNOWN",
            Self::Other(value) => value,
        }
    }

    /// Parses a provider wire value.
    #[must_use]
    pub fn from_provider(value: &str) -> Self {
        match value {
            "UNCONFIRMED" => Self::Unconfirmed,
            "CONFIRMED" => Self::Confirmed,
            "FORCE_CHANGE_PASSWORD" => Self::ForceChangePassword,
            "RESET_REQUIRED" => Self::ResetRequired,
            "ARCHIVED" => Self::Archived,
            "COMPROMISED" => Self::Compromised,
            "EXTERNAL_PROVIDER" => Self::ExternalProvider,
            "UNKNOWN" | "" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AccountStatus {
    fn from(value: String) -> Self {
        Self::from_provider(&value)
    }
}

impl From<AccountStatus> for String {
    fn from(status: AccountStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A directory account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Normalized email address; immutable once created.
    pub username: String,
    /// Provider-managed attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Whether the account may sign in.
    pub enabled: bool,
    /// Provider lifecycle state.
    #[serde(default)]
    pub status: AccountStatus,
    /// Group memberships.
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl Account {
    /// Creates an enabled account with no attributes or groups.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            attributes: BTreeMap::new(),
            enabled: true,
            status: AccountStatus::Unknown,
            groups: BTreeSet::new(),
        }
    }

    /// Sets an attribute value.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns an attribute value, if set.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns an attribute value or the empty string.
    #[must_use]
    pub fn attribute_or_empty(&self, name: &str) -> &str {
        self.attribute(name).unwrap_or_default()
    }

    /// Returns `true` if the account belongs to the administrators group.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.groups.contains(ADMINS_GROUP)
    }
}
