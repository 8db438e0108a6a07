//! In-memory directory for development and tests.
//!
//! Behaves like a provider that is immediately consistent. Every call is
//! recorded, and failures can be injected per primitive and argument.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use acct_model::{Account, AccountStatus, SearchPrefix, ATTR_EMAIL};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{DirectoryError, DirectoryResult};
use crate::provider::{DirectoryProvider, NewAccount};

/// Directory primitives, as seen by the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `create_account`
    CreateAccount,
    /// `get_account`
    GetAccount,
    /// `list_accounts`
    ListAccounts,
    /// `set_enabled`
    SetEnabled,
    /// `add_to_group`
    AddToGroup,
    /// `remove_from_group`
    RemoveFromGroup,
    /// `list_groups`
    ListGroups,
    /// `delete_account`
    DeleteAccount,
}

impl Primitive {
    /// Returns `true` for primitives that change directory state.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::CreateAccount
                | Self::SetEnabled
                | Self::AddToGroup
                | Self::RemoveFromGroup
                | Self::DeleteAccount
        )
    }

    const fn name(self) -> &'static str {
        match self {
            Self::CreateAccount => "create_account",
            Self::GetAccount => "get_account",
            Self::ListAccounts => "list_accounts",
            Self::SetEnabled => "set_enabled",
            Self::AddToGroup => "add_to_group",
            Self::RemoveFromGroup => "remove_from_group",
            Self::ListGroups => "list_groups",
            Self::DeleteAccount => "delete_account",
        }
    }
}

/// One recorded directory call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryCall {
    /// Primitive invoked.
    pub primitive: Primitive,
    /// Target username, if any.
    pub username: Option<String>,
    /// Secondary argument: group name, list filter or enabled flag.
    pub argument: Option<String>,
}

type CallHook = Arc<dyn Fn(&DirectoryCall) + Send + Sync>;

#[derive(Debug, Clone)]
struct InjectedFailure {
    primitive: Primitive,
    target: Option<String>,
}

impl InjectedFailure {
    fn matches(&self, call: &DirectoryCall) -> bool {
        self.primitive == call.primitive
            && self.target.as_ref().is_none_or(|target| {
                call.username.as_deref() == Some(target.as_str())
                    || call.argument.as_deref() == Some(target.as_str())
            })
    }
}

/// Thread-safe in-memory directory.
#[derive(Default)]
pub struct InMemoryDirectory {
    accounts: RwLock<BTreeMap<String, Account>>,
    calls: RwLock<Vec<DirectoryCall>>,
    failures: RwLock<Vec<InjectedFailure>>,
    hook: RwLock<Option<CallHook>>,
}

impl fmt::Debug for InMemoryDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryDirectory")
            .field("accounts", &self.accounts.read().len())
            .field("calls", &self.calls.read().len())
            .finish_non_exhaustive()
    }
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an account as-is, groups included. Not recorded as a call.
    pub fn insert(&self, account: Account) {
        self.accounts
            .write()
            .insert(account.username.clone(), account);
    }

    /// Returns the stored account with its groups. Not recorded as a call.
    #[must_use]
    pub fn account(&self, username: &str) -> Option<Account> {
        self.accounts.read().get(username).cloned()
    }

    /// Returns the number of stored accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    /// Returns `true` if no account is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    /// Makes every future call to `primitive` fail.
    ///
    /// With a `target`, only calls whose username or argument equals it fail.
    pub fn fail(&self, primitive: Primitive, target: Option<&str>) {
        self.failures.write().push(InjectedFailure {
            primitive,
            target: target.map(String::from),
        });
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.failures.write().clear();
    }

    /// Installs a hook invoked synchronously at the start of every call.
    pub fn on_call(&self, hook: impl Fn(&DirectoryCall) + Send + Sync + 'static) {
        *self.hook.write() = Some(Arc::new(hook));
    }

    /// Returns the recorded calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.read().clone()
    }

    /// Returns the recorded calls to one primitive.
    #[must_use]
    pub fn calls_to(&self, primitive: Primitive) -> Vec<DirectoryCall> {
        self.calls
            .read()
            .iter()
            .filter(|call| call.primitive == primitive)
            .cloned()
            .collect()
    }

    /// Returns the number of recorded mutating calls.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|call| call.primitive.is_mutation())
            .count()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.calls.write().clear();
    }

    fn record(
        &self,
        primitive: Primitive,
        username: Option<&str>,
        argument: Option<String>,
    ) -> DirectoryResult<()> {
        let call = DirectoryCall {
            primitive,
            username: username.map(String::from),
            argument,
        };

        let hook = self.hook.read().clone();
        if let Some(hook) = hook {
            hook(&call);
        }

        let injected = self.failures.read().iter().any(|f| f.matches(&call));
        self.calls.write().push(call);

        if injected {
            return Err(DirectoryError::provider(
                primitive.name(),
                "InjectedFailure",
                "failure injected by test",
            ));
        }
        Ok(())
    }

    fn without_groups(account: &Account) -> Account {
        Account {
            groups: BTreeSet::new(),
            ..account.clone()
        }
    }
}

#[async_trait]
impl DirectoryProvider for InMemoryDirectory {
    async fn create_account(&self, account: &NewAccount) -> DirectoryResult<()> {
        self.record(Primitive::CreateAccount, Some(&account.username), None)?;

        let mut accounts = self.accounts.write();
        if accounts.contains_key(&account.username) {
            return Err(DirectoryError::already_exists(&account.username));
        }

        let created = Account {
            username: account.username.clone(),
            attributes: account.attributes.clone(),
            enabled: true,
            status: AccountStatus::ForceChangePassword,
            groups: BTreeSet::new(),
        };
        accounts.insert(created.username.clone(), created);
        Ok(())
    }

    async fn get_account(&self, username: &str) -> DirectoryResult<Option<Account>> {
        self.record(Primitive::GetAccount, Some(username), None)?;
        Ok(self.accounts.read().get(username).map(Self::without_groups))
    }

    async fn list_accounts(
        &self,
        filter: Option<&SearchPrefix>,
        limit: usize,
    ) -> DirectoryResult<Vec<Account>> {
        self.record(
            Primitive::ListAccounts,
            None,
            filter.map(|prefix| prefix.as_str().to_string()),
        )?;

        Ok(self
            .accounts
            .read()
            .values()
            .filter(|account| {
                filter.is_none_or(|prefix| prefix.matches(account.attribute_or_empty(ATTR_EMAIL)))
            })
            .take(limit)
            .map(Self::without_groups)
            .collect())
    }

    async fn set_enabled(&self, username: &str, enabled: bool) -> DirectoryResult<()> {
        self.record(Primitive::SetEnabled, Some(username), Some(enabled.to_string()))?;
        let mut accounts = self.accounts.write();
        let account = accounts
            .get_mut(username)
            .ok_or_else(|| DirectoryError::not_found(username))?;
        account.enabled = enabled;
        Ok(())
    }

    async fn add_to_group(&self, username: &str, group: &str) -> DirectoryResult<()> {
        self.record(Primitive::AddToGroup, Some(username), Some(group.to_string()))?;
        let mut accounts = self.accounts.write();
        let account = accounts
            .get_mut(username)
            .ok_or_else(|| DirectoryError::not_found(username))?;
        account.groups.insert(group.to_string());
        Ok(())
    }

    async fn remove_from_group(&self, username: &str, group: &str) -> DirectoryResult<()> {
        self.record(
            Primitive::RemoveFromGroup,
            Some(username),
            Some(group.to_string()),
        )?;
        let mut accounts = self.accounts.write();
        let account = accounts
            .get_mut(username)
            .ok_or_else(|| DirectoryError::not_found(username))?;
        account.groups.remove(group);
        Ok(())
    }

    async fn list_groups(&self, username: &str) -> DirectoryResult<BTreeSet<String>> {
        self.record(Primitive::ListGroups, Some(username), None)?;
        self.accounts
            .read()
            .get(username)
            .map(|account| account.groups.clone())
            .ok_or_else(|| DirectoryError::not_found(username))
    }

    async fn delete_account(&self, username: &str) -> DirectoryResult<()> {
        self.record(Primitive::DeleteAccount, Some(username), None)?;
        self.accounts
            .write()
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| DirectoryError::not_found(username))
    }
}
