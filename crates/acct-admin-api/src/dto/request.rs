//! Request bodies.

use acct_lifecycle::{CreateAccountRequest, UpdateAccountRequest};
use serde::{Deserialize, Serialize};

/// `POST /admin/create-user`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    /// Email address; becomes the username.
    #[serde(default)]
    pub email: String,
    /// Groups to join.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
}

impl From<CreateUserRequest> for CreateAccountRequest {
    fn from(request: CreateUserRequest) -> Self {
        Self {
            email: request.email,
            groups: request.groups.unwrap_or_default(),
        }
    }
}

/// `POST /admin/list-users`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListUsersRequest {
    /// Email prefix filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// `POST /admin/get-user`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetUserRequest {
    /// Username to fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// `POST /admin/update-user`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserRequest {
    /// Username to update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Enable the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// Disable the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
    /// Groups to join.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_groups: Option<Vec<String>>,
    /// Groups to leave.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_groups: Option<Vec<String>>,
}

impl From<UpdateUserRequest> for UpdateAccountRequest {
    fn from(request: UpdateUserRequest) -> Self {
        Self {
            username: request.username,
            enable: request.enable.unwrap_or(false),
            disable: request.disable.unwrap_or(false),
            add_groups: request.add_groups.unwrap_or_default(),
            remove_groups: request.remove_groups.unwrap_or_default(),
        }
    }
}

/// `POST /admin/delete-user`
///
/// The caller is taken from the bearer token; `sub` names the target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteUserRequest {
    /// Username to delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}
