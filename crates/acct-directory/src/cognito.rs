//! Amazon Cognito user pool adapter.
//!
//! Maps the directory primitives onto the Cognito admin API:
//!
//! | Primitive | Cognito action |
//! |-----------|----------------|
//! | `create_account` | `AdminCreateUser` |
//! | `get_account` | `AdminGetUser` |
//! | `list_accounts` | `ListUsers` (`email ^= "<prefix>"`) |
//! | `set_enabled` | `AdminEnableUser` / `AdminDisableUser` |
//! | `add_to_group` | `AdminAddUserToGroup` |
//! | `remove_from_group` | `AdminRemoveUserFromGroup` |
//! | `list_groups` | `AdminListGroupsForUser` |
//! | `delete_account` | `AdminDeleteUser` |
//!
//! The SDK client is built once with bounded timeouts and retries disabled.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use acct_model::{Account, AccountStatus, SearchPrefix, ATTR_EMAIL};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cognitoidentityprovider::types::{AttributeType, DeliveryMediumType, UserStatusType};
use aws_sdk_cognitoidentityprovider::Client;

use crate::error::{DirectoryError, DirectoryResult};
use crate::provider::{DeliveryMedium, DirectoryProvider, NewAccount};

/// Largest page `ListUsers` accepts.
pub const MAX_PAGE_SIZE: usize = 60;

/// Cognito adapter configuration.
#[derive(Debug, Clone)]
pub struct CognitoConfig {
    /// User pool identifier.
    pub user_pool_id: String,
    /// Region; the SDK default chain is used when absent.
    pub region: Option<String>,
    /// Endpoint override, e.g. a local emulator.
    pub endpoint_url: Option<String>,
    /// Per-operation timeout.
    pub timeout: Duration,
}

impl CognitoConfig {
    /// Creates a configuration for a pool with a 5 second timeout.
    #[must_use]
    pub fn new(user_pool_id: impl Into<String>) -> Self {
        Self {
            user_pool_id: user_pool_id.into(),
            region: None,
            endpoint_url: None,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Directory backed by a Cognito user pool.
#[derive(Debug, Clone)]
pub struct CognitoDirectory {
    client: Client,
    user_pool_id: String,
}

impl CognitoDirectory {
    /// Builds the SDK client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Config` if the pool id is blank.
    pub async fn connect(config: &CognitoConfig) -> DirectoryResult<Self> {
        if config.user_pool_id.trim().is_empty() {
            return Err(DirectoryError::Config(
                "user pool id must not be empty".to_string(),
            ));
        }

        let timeouts = TimeoutConfig::builder()
            .operation_timeout(config.timeout)
            .operation_attempt_timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(3)))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .timeout_config(timeouts)
            .retry_config(RetryConfig::disabled());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        tracing::info!(
            user_pool_id = %config.user_pool_id,
            region = ?sdk_config.region(),
            timeout_ms = config.timeout.as_millis() as u64,
            "Cognito directory initialized"
        );

        Ok(Self::from_client(Client::new(&sdk_config), &config.user_pool_id))
    }

    /// Wraps an existing SDK client.
    #[must_use]
    pub fn from_client(client: Client, user_pool_id: impl Into<String>) -> Self {
        Self {
            client,
            user_pool_id: user_pool_id.into(),
        }
    }
}

/// Translates an SDK failure into a directory error.
fn map_sdk_error<E>(operation: &'static str, username: &str, err: SdkError<E>) -> DirectoryError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if let SdkError::TimeoutError(_) = err {
        return DirectoryError::Timeout { operation };
    }
    match err.code() {
        Some("UserNotFoundException") => DirectoryError::not_found(username),
        Some("UsernameExistsException") => DirectoryError::already_exists(username),
        code => DirectoryError::provider(
            operation,
            code.unwrap_or("Unknown"),
            err.message()
                .map_or_else(|| DisplayErrorContext(&err).to_string(), String::from),
        ),
    }
}

fn attribute_map(attributes: &[AttributeType]) -> BTreeMap<String, String> {
    attributes
        .iter()
        .filter_map(|attr| attr.value().map(|v| (attr.name().to_string(), v.to_string())))
        .collect()
}

fn status_of(status: Option<&UserStatusType>) -> AccountStatus {
    status.map_or(AccountStatus::Unknown, |s| AccountStatus::from_provider(s.as_str()))
}

/// Builds a `ListUsers` filter expression. The prefix alphabet excludes
/// quotes, so no escaping is needed.
fn email_filter(prefix: &SearchPrefix) -> String {
    format!("{ATTR_EMAIL} ^= \"{}\"", prefix.as_str())
}

#[async_trait]
impl DirectoryProvider for CognitoDirectory {
    async fn create_account(&self, account: &NewAccount) -> DirectoryResult<()> {
        const OP: &str = "AdminCreateUser";

        let attributes = account
            .attributes
            .iter()
            .map(|(name, value)| {
                AttributeType::builder()
                    .name(name)
                    .value(value)
                    .build()
                    .map_err(|e| DirectoryError::provider(OP, "InvalidAttribute", e.to_string()))
            })
            .collect::<DirectoryResult<Vec<_>>>()?;

        let medium = match account.delivery {
            DeliveryMedium::Email => DeliveryMediumType::Email,
            DeliveryMedium::Sms => DeliveryMediumType::Sms,
        };

        self.client
            .admin_create_user()
            .user_pool_id(&self.user_pool_id)
            .username(&account.username)
            .set_user_attributes(Some(attributes))
            .set_temporary_password(account.temporary_password.clone())
            .desired_delivery_mediums(medium)
            .send()
            .await
            .map_err(|e| map_sdk_error(OP, &account.username, e))?;
        Ok(())
    }

    async fn get_account(&self, username: &str) -> DirectoryResult<Option<Account>> {
        let result = self
            .client
            .admin_get_user()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Some(Account {
                username: output.username().to_string(),
                attributes: attribute_map(output.user_attributes()),
                enabled: output.enabled(),
                status: status_of(output.user_status()),
                groups: BTreeSet::new(),
            })),
            Err(err) => match map_sdk_error("AdminGetUser", username, err) {
                DirectoryError::NotFound { .. } => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn list_accounts(
        &self,
        filter: Option<&SearchPrefix>,
        limit: usize,
    ) -> DirectoryResult<Vec<Account>> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let output = self
            .client
            .list_users()
            .user_pool_id(&self.user_pool_id)
            .limit(limit as i32)
            .set_filter(filter.map(email_filter))
            .send()
            .await
            .map_err(|e| map_sdk_error("ListUsers", "", e))?;

        output
            .users()
            .iter()
            .map(|user| {
                let username = user.username().ok_or_else(|| {
                    DirectoryError::InvalidResponse("ListUsers returned a user without username".to_string())
                })?;
                Ok(Account {
                    username: username.to_string(),
                    attributes: attribute_map(user.attributes()),
                    enabled: user.enabled(),
                    status: status_of(user.user_status()),
                    groups: BTreeSet::new(),
                })
            })
            .collect()
    }

    async fn set_enabled(&self, username: &str, enabled: bool) -> DirectoryResult<()> {
        if enabled {
            self.client
                .admin_enable_user()
                .user_pool_id(&self.user_pool_id)
                .username(username)
                .send()
                .await
                .map_err(|e| map_sdk_error("AdminEnableUser", username, e))?;
        } else {
            self.client
                .admin_disable_user()
                .user_pool_id(&self.user_pool_id)
                .username(username)
                .send()
                .await
                .map_err(|e| map_sdk_error("AdminDisableUser", username, e))?;
        }
        Ok(())
    }

    async fn add_to_group(&self, username: &str, group: &str) -> DirectoryResult<()> {
        self.client
            .admin_add_user_to_group()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .group_name(group)
            .send()
            .await
            .map_err(|e| map_sdk_error("AdminAddUserToGroup", username, e))?;
        Ok(())
    }

    async fn remove_from_group(&self, username: &str, group: &str) -> DirectoryResult<()> {
        self.client
            .admin_remove_user_from_group()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .group_name(group)
            .send()
            .await
            .map_err(|e| map_sdk_error("AdminRemoveUserFromGroup", username, e))?;
        Ok(())
    }

    async fn list_groups(&self, username: &str) -> DirectoryResult<BTreeSet<String>> {
        let mut groups = BTreeSet::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .admin_list_groups_for_user()
                .user_pool_id(&self.user_pool_id)
                .username(username)
                .limit(MAX_PAGE_SIZE as i32)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| map_sdk_error("AdminListGroupsForUser", username, e))?;

            groups.extend(
                output
                    .groups()
                    .iter()
                    .filter_map(|group| group.group_name().map(String::from)),
            );

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(groups)
    }

    async fn delete_account(&self, username: &str) -> DirectoryResult<()> {
        self.client
            .admin_delete_user()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .send()
            .await
            .map_err(|e| map_sdk_error("AdminDeleteUser", username, e))?;
        Ok(())
    }
}
