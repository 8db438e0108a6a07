//! Response bodies.

use acct_lifecycle::DenyReason;
use acct_model::{Account, ATTR_EMAIL, ATTR_FAMILY_NAME, ATTR_GIVEN_NAME};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// One account, flattened for the admin table.
///
/// Unset attributes are rendered as empty strings and groups are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    /// Normalized username.
    pub username: String,
    /// Whether the account can sign in.
    pub enabled: bool,
    /// Provider lifecycle status.
    pub status: String,
    /// `email` attribute.
    pub email: String,
    /// `given_name` attribute.
    pub given_name: String,
    /// `family_name` attribute.
    pub family_name: String,
    /// Group memberships.
    pub groups: Vec<String>,
}

impl From<Account> for UserRow {
    fn from(account: Account) -> Self {
        Self {
            email: account.attribute_or_empty(ATTR_EMAIL).to_string(),
            given_name: account.attribute_or_empty(ATTR_GIVEN_NAME).to_string(),
            family_name: account.attribute_or_empty(ATTR_FAMILY_NAME).to_string(),
            status: account.status.to_string(),
            enabled: account.enabled,
            groups: account.groups.into_iter().collect(),
            username: account.username,
        }
    }
}

/// Create result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreateUserResponse {
    /// `{ok: true, username}`
    Created {
        /// Always `true`.
        ok: bool,
        /// Normalized username.
        username: String,
    },
    /// `{userExists: true}`
    Exists {
        /// Always `true`.
        #[serde(rename = "userExists")]
        user_exists: bool,
    },
}

impl CreateUserResponse {
    /// New account.
    #[must_use]
    pub fn created(username: impl Into<String>) -> Self {
        Self::Created {
            ok: true,
            username: username.into(),
        }
    }

    /// Account already existed.
    #[must_use]
    pub const fn exists() -> Self {
        Self::Exists { user_exists: true }
    }
}

/// List result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResponse {
    /// One page of accounts.
    pub users: Vec<UserRow>,
}

/// Get result; `user` is `null` when the account does not exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserResponse {
    /// The account, if any.
    pub user: Option<UserRow>,
}

/// Update result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserResponse {
    /// Always `true`.
    pub ok: bool,
    /// Groups observed after the update, sorted.
    pub groups: Vec<String>,
}

/// Delete result.
///
/// Denials are reported in the body with `ok: false`. Only a missing target
/// (400) and a directory failure (500) change the status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    /// Whether the request was honoured.
    pub ok: bool,
    /// Whether an account was removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    /// Why nothing was deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DeleteUserResponse {
    /// The account was removed.
    #[must_use]
    pub const fn deleted() -> Self {
        Self {
            ok: true,
            deleted: Some(true),
            reason: None,
        }
    }

    /// The account did not exist.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            ok: true,
            deleted: Some(false),
            reason: Some("not_found".to_string()),
        }
    }

    /// The guard refused the deletion.
    #[must_use]
    pub fn denied(reason: DenyReason) -> Self {
        Self {
            ok: false,
            deleted: None,
            reason: Some(reason.as_str().to_string()),
        }
    }

    /// The directory failed.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            ok: false,
            deleted: None,
            reason: Some("delete_failed".to_string()),
        }
    }

    /// Returns the HTTP status for this result.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.reason.as_deref() {
            Some("missing_target") => StatusCode::BAD_REQUEST,
            Some("delete_failed") => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }
}

impl IntoResponse for DeleteUserResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
