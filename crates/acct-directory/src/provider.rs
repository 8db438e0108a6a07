//! Directory provider trait.

use std::collections::{BTreeMap, BTreeSet};

use acct_model::{Account, SearchPrefix};
use async_trait::async_trait;

use crate::error::DirectoryResult;

/// Channel used to deliver the temporary credential of a new account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMedium {
    /// Deliver by email.
    #[default]
    Email,
    /// Deliver by SMS.
    Sms,
}

/// Input for [`DirectoryProvider::create_account`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Normalized username.
    pub username: String,
    /// Attributes set at creation.
    pub attributes: BTreeMap<String, String>,
    /// Temporary credential; `None` lets the provider issue one.
    pub temporary_password: Option<String>,
    /// Delivery channel for the credential.
    pub delivery: DeliveryMedium,
}

impl NewAccount {
    /// Creates a request with no attributes and a provider-issued credential.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            attributes: BTreeMap::new(),
            temporary_password: None,
            delivery: DeliveryMedium::Email,
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Admin primitives of an identity directory.
///
/// Each method is a single provider round trip. Implementations perform no
/// retries and must be safe to share across concurrent requests.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// Creates an account.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::AlreadyExists` if the username is taken.
    async fn create_account(&self, account: &NewAccount) -> DirectoryResult<()>;

    /// Fetches an account. Groups are not populated.
    async fn get_account(&self, username: &str) -> DirectoryResult<Option<Account>>;

    /// Lists one page of accounts, optionally filtered by email prefix.
    /// Groups are not populated.
    async fn list_accounts(
        &self,
        filter: Option<&SearchPrefix>,
        limit: usize,
    ) -> DirectoryResult<Vec<Account>>;

    /// Enables or disables an account.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::NotFound` if the account doesn't exist.
    async fn set_enabled(&self, username: &str, enabled: bool) -> DirectoryResult<()>;

    /// Adds an account to a group. Adding an existing member succeeds.
    async fn add_to_group(&self, username: &str, group: &str) -> DirectoryResult<()>;

    /// Removes an account from a group. Removing a non-member succeeds.
    async fn remove_from_group(&self, username: &str, group: &str) -> DirectoryResult<()>;

    /// Lists the groups an account belongs to.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::NotFound` if the account doesn't exist.
    async fn list_groups(&self, username: &str) -> DirectoryResult<BTreeSet<String>>;

    /// Deletes an account.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::NotFound` if the account doesn't exist.
    async fn delete_account(&self, username: &str) -> DirectoryResult<()>;
}
