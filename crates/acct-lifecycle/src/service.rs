//! Lifecycle operations.
//!
//! [`AccountLifecycle`] composes the directory adapter with validation, the
//! authorization guard, the idempotency policy and group enrichment. It holds
//! no mutable state; one instance serves all requests.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use acct_directory::{DirectoryError, DirectoryProvider, NewAccount};
use acct_model::{
    normalize_group_names, normalize_username, Account, Caller, SearchPrefix, ATTR_EMAIL,
    ATTR_EMAIL_VERIFIED,
};
use tokio_util::sync::CancellationToken;

use crate::call::CallContext;
use crate::enrichment::{enrich, enrich_all};
use crate::error::{LifecycleError, LifecycleResult, ValidationError};
use crate::guard::{can_delete, DeleteDecision, DenyReason};
use crate::idempotency::{self, CreateDecision};
use crate::report::{GroupChange, GroupChangeReport};
use crate::validation::validate_email;

/// Default list page size.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Tuning for lifecycle operations.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Accounts returned by one list call.
    pub list_limit: usize,
    /// Group lookups in flight during list enrichment.
    pub enrichment_concurrency: usize,
    /// Upper bound on any single directory call.
    pub call_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_LIST_LIMIT,
            enrichment_concurrency: 8,
            call_timeout: Duration::from_secs(8),
        }
    }
}

/// Create request.
#[derive(Debug, Clone, Default)]
pub struct CreateAccountRequest {
    /// Raw email; becomes the username once normalized.
    pub email: String,
    /// Groups to join after creation.
    pub groups: Vec<String>,
}

/// Create result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new account was created.
    Created {
        /// Normalized username.
        username: String,
        /// Outcome of the requested group additions.
        groups: GroupChangeReport,
    },
    /// The account already existed; nothing changed.
    AlreadyExists {
        /// Normalized username.
        username: String,
    },
}

/// Update request.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountRequest {
    /// Target username.
    pub username: Option<String>,
    /// Enable the account.
    pub enable: bool,
    /// Disable the account.
    pub disable: bool,
    /// Groups to join.
    pub add_groups: Vec<String>,
    /// Groups to leave.
    pub remove_groups: Vec<String>,
}

/// Update result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Normalized username.
    pub username: String,
    /// New enabled flag, if it was changed.
    pub enabled: Option<bool>,
    /// Group set observed after all changes settled.
    pub groups: BTreeSet<String>,
    /// Per-group outcome of the requested changes.
    pub report: GroupChangeReport,
}

/// Delete result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The account was deleted.
    Deleted,
    /// The account did not exist.
    NotFound,
    /// The guard refused the deletion.
    Denied(DenyReason),
}

/// Admin operations on directory accounts.
pub struct AccountLifecycle {
    directory: Arc<dyn DirectoryProvider>,
    config: LifecycleConfig,
}

impl std::fmt::Debug for AccountLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountLifecycle")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AccountLifecycle {
    /// Creates the service over a directory.
    pub fn new(directory: Arc<dyn DirectoryProvider>, config: LifecycleConfig) -> Self {
        Self { directory, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    fn ctx<'a>(&self, cancel: &'a CancellationToken) -> CallContext<'a> {
        CallContext::new(cancel, self.config.call_timeout)
    }

    /// Creates an account, or reports that it already exists.
    ///
    /// Group additions are best-effort and reported in the outcome.
    ///
    /// # Errors
    ///
    /// - `Validation(InvalidEmail)` for a malformed address
    /// - `Directory` if the existence probe or the create call fails
    /// - `Cancelled` if `cancel` fires first
    pub async fn create(
        &self,
        request: CreateAccountRequest,
        cancel: &CancellationToken,
    ) -> LifecycleResult<CreateOutcome> {
        validate_email(&request.email)?;
        let username = normalize_username(&request.email);
        let groups = normalize_group_names(&request.groups);
        let ctx = self.ctx(cancel);

        let probe = ctx
            .run("get_account", self.directory.get_account(&username))
            .await?
            .map_err(|e| LifecycleError::directory("get_account", e))?;

        if idempotency::decide(probe.as_ref()) == CreateDecision::AlreadyExists {
            tracing::info!(username = %username, "Account already exists; create is a no-op");
            return Ok(CreateOutcome::AlreadyExists { username });
        }

        let new_account = NewAccount::new(&username)
            .attribute(ATTR_EMAIL, &username)
            .attribute(ATTR_EMAIL_VERIFIED, "true");

        match ctx
            .run("create_account", self.directory.create_account(&new_account))
            .await?
        {
            Ok(()) => {}
            Err(err) if idempotency::lost_race(&err) => {
                tracing::info!(username = %username, "Concurrent create won; reporting existing account");
                return Ok(CreateOutcome::AlreadyExists { username });
            }
            Err(err) => return Err(LifecycleError::directory("create_account", err)),
        }

        let mut report = GroupChangeReport::default();
        for group in groups {
            let result = ctx
                .run("add_to_group", self.directory.add_to_group(&username, &group))
                .await
                .map_err(|_| {
                    tracing::warn!(
                        username = %username,
                        applied = ?report.applied_summary(),
                        "Create cancelled after the account was created"
                    );
                    LifecycleError::Cancelled {
                        created: Some(username.clone()),
                        applied: report.clone(),
                    }
                })?;
            report.record(GroupChange::Added(group), result);
        }

        if report.has_failures() {
            tracing::warn!(
                username = %username,
                failed = ?report.failed,
                "Account created but some group additions failed"
            );
        }
        tracing::info!(
            username = %username,
            groups = ?report.applied_summary(),
            "Account created"
        );

        Ok(CreateOutcome::Created {
            username,
            groups: report,
        })
    }

    /// Lists one page of accounts with their groups.
    ///
    /// A search that fails prefix validation is dropped and the page is
    /// unfiltered.
    ///
    /// # Errors
    ///
    /// - `Directory` if the list call fails
    /// - `Cancelled` if `cancel` fires first
    pub async fn list(
        &self,
        search: Option<&str>,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Vec<Account>> {
        let filter = search.and_then(|raw| {
            let parsed = SearchPrefix::parse(raw);
            if parsed.is_none() {
                tracing::debug!(search = %raw, "Search rejected by prefix validation; listing unfiltered");
            }
            parsed
        });
        let ctx = self.ctx(cancel);

        let accounts = ctx
            .run(
                "list_accounts",
                self.directory
                    .list_accounts(filter.as_ref(), self.config.list_limit),
            )
            .await?
            .map_err(|e| LifecycleError::directory("list_accounts", e))?;

        enrich_all(
            self.directory.as_ref(),
            ctx,
            accounts,
            self.config.enrichment_concurrency,
        )
        .await
    }

    /// Fetches one account with its groups. Returns `None` if it doesn't
    /// exist.
    ///
    /// # Errors
    ///
    /// - `Validation(MissingUsername)` for a blank username
    /// - `Directory` if the fetch fails
    /// - `Cancelled` if `cancel` fires first
    pub async fn get(
        &self,
        username: &str,
        cancel: &CancellationToken,
    ) -> LifecycleResult<Option<Account>> {
        let username = normalize_username(username);
        if username.is_empty() {
            return Err(ValidationError::MissingUsername.into());
        }
        let ctx = self.ctx(cancel);

        let account = ctx
            .run("get_account", self.directory.get_account(&username))
            .await?
            .map_err(|e| LifecycleError::directory("get_account", e))?;

        match account {
            Some(account) => Ok(Some(enrich(self.directory.as_ref(), ctx, account).await?)),
            None => Ok(None),
        }
    }

    /// Toggles the enabled flag and applies group changes.
    ///
    /// Each group change is attempted independently; the returned group set
    /// is the one observed afterwards, not the one requested.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank username or conflicting flags, before any
    ///   directory call
    /// - `NotFound` if the account doesn't exist
    /// - `Directory` if the probe or the enable/disable call fails
    /// - `Cancelled` (carrying the changes already applied) if `cancel` fires
    pub async fn update(
        &self,
        request: UpdateAccountRequest,
        cancel: &CancellationToken,
    ) -> LifecycleResult<UpdateOutcome> {
        let username = request
            .username
            .as_deref()
            .map(normalize_username)
            .filter(|u| !u.is_empty())
            .ok_or(ValidationError::MissingUsername)?;
        if request.enable && request.disable {
            return Err(ValidationError::ConflictingEnableDisable.into());
        }
        let ctx = self.ctx(cancel);

        let exists = ctx
            .run("get_account", self.directory.get_account(&username))
            .await?
            .map_err(|e| LifecycleError::directory("get_account", e))?
            .is_some();
        if !exists {
            return Err(LifecycleError::NotFound { username });
        }

        let enabled = match (request.enable, request.disable) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        if let Some(enabled) = enabled {
            ctx.run("set_enabled", self.directory.set_enabled(&username, enabled))
                .await?
                .map_err(|e| match e {
                    DirectoryError::NotFound { username } => LifecycleError::NotFound { username },
                    other => LifecycleError::directory("set_enabled", other),
                })?;
            tracing::info!(username = %username, enabled, "Account enabled flag updated");
        }

        let changes = normalize_group_names(&request.add_groups)
            .into_iter()
            .map(GroupChange::Added)
            .chain(
                normalize_group_names(&request.remove_groups)
                    .into_iter()
                    .map(GroupChange::Removed),
            );

        let mut report = GroupChangeReport::default();
        for change in changes {
            let call = match &change {
                GroupChange::Added(group) => self.directory.add_to_group(&username, group),
                GroupChange::Removed(group) => self.directory.remove_from_group(&username, group),
            };
            let operation = match change {
                GroupChange::Added(_) => "add_to_group",
                GroupChange::Removed(_) => "remove_from_group",
            };
            match ctx.run(operation, call).await {
                Ok(result) => report.record(change, result),
                Err(_) => {
                    tracing::warn!(
                        username = %username,
                        applied = ?report.applied_summary(),
                        "Update cancelled during group changes"
                    );
                    return Err(LifecycleError::Cancelled {
                        created: None,
                        applied: report,
                    });
                }
            }
        }

        if report.has_failures() {
            tracing::warn!(
                username = %username,
                failed = ?report.failed,
                "Some group changes failed"
            );
        }

        let groups = match ctx
            .run("list_groups", self.directory.list_groups(&username))
            .await
        {
            Ok(Ok(groups)) => groups,
            Ok(Err(err)) => {
                tracing::warn!(
                    username = %username,
                    error = %err,
                    "Group lookup after update failed; reporting no groups"
                );
                BTreeSet::new()
            }
            Err(_) => {
                return Err(LifecycleError::Cancelled {
                    created: None,
                    applied: report,
                })
            }
        };

        tracing::info!(
            username = %username,
            changes = ?report.applied_summary(),
            "Account updated"
        );

        Ok(UpdateOutcome {
            username,
            enabled,
            groups,
            report,
        })
    }

    /// Deletes an account on behalf of `caller`.
    ///
    /// The guard runs before any directory call and again once the target's
    /// current groups are known. A missing account is reported as
    /// [`DeleteOutcome::NotFound`], never as an error.
    ///
    /// # Errors
    ///
    /// - `DeleteFailed` if the group check or the delete call fails
    /// - `Cancelled` if `cancel` fires first
    pub async fn delete(
        &self,
        caller: &Caller,
        target: Option<&str>,
        cancel: &CancellationToken,
    ) -> LifecycleResult<DeleteOutcome> {
        let target = target
            .map(normalize_username)
            .filter(|u| !u.is_empty())
            .map(Account::new);

        if let DeleteDecision::Denied(reason) = can_delete(caller, target.as_ref()) {
            return Ok(Self::denied(caller, target.as_ref(), reason));
        }
        let Some(mut target) = target else {
            return Ok(DeleteOutcome::Denied(DenyReason::MissingTarget));
        };
        let ctx = self.ctx(cancel);

        match ctx
            .run("list_groups", self.directory.list_groups(&target.username))
            .await?
        {
            Ok(groups) => target.groups = groups,
            Err(err) if err.is_not_found() => {
                tracing::info!(username = %target.username, "Delete target already gone");
                return Ok(DeleteOutcome::NotFound);
            }
            Err(err) => {
                tracing::error!(
                    username = %target.username,
                    error = %err,
                    "Cannot verify target groups; refusing to delete"
                );
                return Err(LifecycleError::DeleteFailed(err));
            }
        }

        if let DeleteDecision::Denied(reason) = can_delete(caller, Some(&target)) {
            return Ok(Self::denied(caller, Some(&target), reason));
        }

        match ctx
            .run("delete_account", self.directory.delete_account(&target.username))
            .await?
        {
            Ok(()) => {
                tracing::info!(
                    username = %target.username,
                    caller = %caller.username,
                    "Account deleted"
                );
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) if err.is_not_found() => Ok(DeleteOutcome::NotFound),
            Err(err) => {
                tracing::error!(username = %target.username, error = %err, "Delete failed");
                Err(LifecycleError::DeleteFailed(err))
            }
        }
    }

    fn denied(caller: &Caller, target: Option<&Account>, reason: DenyReason) -> DeleteOutcome {
        tracing::warn!(
            caller = %caller.username,
            target = target.map_or("", |t| t.username.as_str()),
            reason = %reason,
            "Delete denied"
        );
        DeleteOutcome::Denied(reason)
    }
}

#[cfg(test)]
mod tests {
    use acct_directory::{InMemoryDirectory, Primitive};
    use acct_model::{AccountStatus, ADMINS_GROUP};

    use super::*;

    fn service(directory: &Arc<InMemoryDirectory>) -> AccountLifecycle {
        AccountLifecycle::new(directory.clone(), LifecycleConfig::default())
    }

    fn seeded(accounts: &[(&str, &[&str])]) -> Arc<InMemoryDirectory> {
        let directory = Arc::new(InMemoryDirectory::new());
        for (username, groups) in accounts {
            let mut account = Account::new(*username).with_attribute(ATTR_EMAIL, *username);
            account.groups.extend(groups.iter().map(|g| g.to_string()));
            directory.insert(account);
        }
        directory
    }

    fn admin() -> Caller {
        Caller::new("boss@corp.io", "sub-boss").with_groups([ADMINS_GROUP])
    }

    fn update(username: &str) -> UpdateAccountRequest {
        UpdateAccountRequest {
            username: Some(username.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_normalizes_and_joins_groups() {
        let directory = seeded(&[]);
        let cancel = CancellationToken::new();

        let outcome = service(&directory)
            .create(
                CreateAccountRequest {
                    email: "  Jane.Doe@Example.com ".into(),
                    groups: vec!["USERS".into(), " ".into(), "USERS".into()],
                },
                &cancel,
            )
            .await
            .unwrap();

        let CreateOutcome::Created { username, groups } = outcome else {
            panic!("expected a new account");
        };
        assert_eq!(username, "jane.doe@example.com");
        assert_eq!(groups.applied, vec![GroupChange::Added("USERS".into())]);

        let stored = directory.account("jane.doe@example.com").unwrap();
        assert_eq!(stored.attribute(ATTR_EMAIL), Some("jane.doe@example.com"));
        assert_eq!(stored.attribute(ATTR_EMAIL_VERIFIED), Some("true"));
        assert_eq!(stored.status, AccountStatus::ForceChangePassword);
        assert!(stored.groups.contains("USERS"));
        assert_eq!(directory.calls_to(Primitive::AddToGroup).len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_bad_email_without_directory_calls() {
        let directory = seeded(&[]);
        let cancel = CancellationToken::new();

        let err = service(&directory)
            .create(
                CreateAccountRequest {
                    email: "not-an-email".into(),
                    groups: vec![],
                },
                &cancel,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::Validation(ValidationError::InvalidEmail)
        ));
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn duplicate_create_is_a_no_op() {
        let directory = seeded(&[("jane@example.com", &["OPS"])]);
        let cancel = CancellationToken::new();

        let outcome = service(&directory)
            .create(
                CreateAccountRequest {
                    email: "JANE@example.com".into(),
                    groups: vec!["USERS".into()],
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CreateOutcome::AlreadyExists {
                username: "jane@example.com".into()
            }
        );
        assert_eq!(directory.mutation_count(), 0);
        let stored = directory.account("jane@example.com").unwrap();
        assert_eq!(stored.groups, BTreeSet::from(["OPS".to_string()]));
    }

    #[tokio::test]
    async fn create_survives_failed_group_addition() {
        let directory = seeded(&[]);
        directory.fail(Primitive::AddToGroup, Some("BROKEN"));
        let cancel = CancellationToken::new();

        let outcome = service(&directory)
            .create(
                CreateAccountRequest {
                    email: "sam@example.com".into(),
                    groups: vec!["BROKEN".into(), "USERS".into()],
                },
                &cancel,
            )
            .await
            .unwrap();

        let CreateOutcome::Created { groups, .. } = outcome else {
            panic!("expected a new account");
        };
        assert_eq!(groups.applied, vec![GroupChange::Added("USERS".into())]);
        assert_eq!(groups.failed.len(), 1);
        assert_eq!(groups.failed[0].change, GroupChange::Added("BROKEN".into()));
    }

    #[tokio::test]
    async fn create_cancelled_after_account_exists_names_it() {
        let directory = seeded(&[]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        directory.on_call(move |call| {
            if call.primitive == Primitive::AddToGroup {
                trigger.cancel();
            }
        });

        let err = service(&directory)
            .create(
                CreateAccountRequest {
                    email: "sam@example.com".into(),
                    groups: vec!["A".into(), "B".into()],
                },
                &cancel,
            )
            .await
            .unwrap_err();

        let LifecycleError::Cancelled { created, applied } = err else {
            panic!("expected cancellation");
        };
        assert_eq!(created.as_deref(), Some("sam@example.com"));
        assert_eq!(applied.applied, vec![GroupChange::Added("A".into())]);
        assert!(directory.account("sam@example.com").is_some());
    }

    #[tokio::test]
    async fn list_attaches_groups_and_tolerates_lookup_failures() {
        let directory = seeded(&[
            ("ann@example.com", &["USERS"]),
            ("bob@example.com", &["OPS"]),
        ]);
        directory.fail(Primitive::ListGroups, Some("bob@example.com"));
        let cancel = CancellationToken::new();

        let rows = service(&directory).list(None, &cancel).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].groups.contains("USERS"));
        assert!(rows[1].groups.is_empty());
    }

    #[tokio::test]
    async fn list_drops_invalid_search() {
        let directory = seeded(&[("ann@example.com", &[]), ("bob@example.com", &[])]);
        let cancel = CancellationToken::new();
        let service = service(&directory);

        let filtered = service.list(Some(" ANN"), &cancel).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].username, "ann@example.com");

        let unfiltered = service.list(Some("a*b"), &cancel).await.unwrap();
        assert_eq!(unfiltered.len(), 2);
        let list_calls = directory.calls_to(Primitive::ListAccounts);
        assert_eq!(list_calls[1].argument, None);
    }

    #[tokio::test]
    async fn list_respects_limit() {
        let directory = seeded(&[
            ("a@example.com", &[]),
            ("b@example.com", &[]),
            ("c@example.com", &[]),
        ]);
        let cancel = CancellationToken::new();
        let service = AccountLifecycle::new(
            directory.clone(),
            LifecycleConfig {
                list_limit: 2,
                ..Default::default()
            },
        );

        assert_eq!(service.list(None, &cancel).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn get_returns_none_for_missing_account() {
        let directory = seeded(&[("ann@example.com", &["USERS"])]);
        let cancel = CancellationToken::new();
        let service = service(&directory);

        let found = service.get("ANN@example.com", &cancel).await.unwrap().unwrap();
        assert!(found.groups.contains("USERS"));

        assert!(service.get("ghost@example.com", &cancel).await.unwrap().is_none());
        assert!(service.get("  ", &cancel).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn conflicting_flags_make_no_directory_calls() {
        let directory = seeded(&[("ann@example.com", &[])]);
        let cancel = CancellationToken::new();

        let err = service(&directory)
            .update(
                UpdateAccountRequest {
                    enable: true,
                    disable: true,
                    add_groups: vec!["USERS".into()],
                    ..update("ann@example.com")
                },
                &cancel,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::Validation(ValidationError::ConflictingEnableDisable)
        ));
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn update_missing_username_or_account() {
        let directory = seeded(&[]);
        let cancel = CancellationToken::new();
        let service = service(&directory);

        let err = service
            .update(UpdateAccountRequest::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Validation(ValidationError::MissingUsername)
        ));

        let err = service
            .update(
                UpdateAccountRequest {
                    disable: true,
                    ..update("ghost@example.com")
                },
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound { .. }));
        assert_eq!(directory.mutation_count(), 0);
    }

    #[tokio::test]
    async fn update_reports_observed_groups() {
        let directory = seeded(&[("ann@example.com", &["OPS", "LEGACY"])]);
        directory.fail(Primitive::RemoveFromGroup, Some("LEGACY"));
        let cancel = CancellationToken::new();

        let outcome = service(&directory)
            .update(
                UpdateAccountRequest {
                    disable: true,
                    add_groups: vec!["USERS".into()],
                    remove_groups: vec!["OPS".into(), "LEGACY".into()],
                    ..update("Ann@Example.com")
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(outcome.username, "ann@example.com");
        assert_eq!(outcome.enabled, Some(false));
        assert_eq!(
            outcome.groups,
            BTreeSet::from(["LEGACY".to_string(), "USERS".to_string()])
        );
        assert!(outcome.report.has_failures());
        assert!(!directory.account("ann@example.com").unwrap().enabled);

        let order: Vec<_> = directory
            .calls()
            .into_iter()
            .filter(|c| c.primitive.is_mutation())
            .map(|c| c.primitive)
            .collect();
        assert_eq!(
            order,
            [
                Primitive::SetEnabled,
                Primitive::AddToGroup,
                Primitive::RemoveFromGroup,
                Primitive::RemoveFromGroup,
            ]
        );
    }

    #[tokio::test]
    async fn update_falls_back_to_no_groups_when_final_lookup_fails() {
        let directory = seeded(&[("ann@example.com", &["OPS"])]);
        directory.fail(Primitive::ListGroups, None);
        let cancel = CancellationToken::new();

        let outcome = service(&directory)
            .update(
                UpdateAccountRequest {
                    enable: true,
                    ..update("ann@example.com")
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(outcome.enabled, Some(true));
        assert!(outcome.groups.is_empty());
    }

    #[tokio::test]
    async fn update_cancelled_midway_reports_applied_changes() {
        let directory = seeded(&[("ann@example.com", &[])]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        directory.on_call(move |call| {
            if call.primitive == Primitive::AddToGroup && call.argument.as_deref() == Some("B") {
                trigger.cancel();
            }
        });

        let err = service(&directory)
            .update(
                UpdateAccountRequest {
                    add_groups: vec!["A".into(), "B".into(), "C".into()],
                    ..update("ann@example.com")
                },
                &cancel,
            )
            .await
            .unwrap_err();

        let LifecycleError::Cancelled { created, applied } = err else {
            panic!("expected cancellation");
        };
        assert_eq!(created, None);
        assert_eq!(
            applied.applied,
            vec![GroupChange::Added("A".into()), GroupChange::Added("B".into())]
        );
        let groups = directory.account("ann@example.com").unwrap().groups;
        assert_eq!(groups, BTreeSet::from(["A".to_string(), "B".to_string()]));
        assert!(directory
            .calls_to(Primitive::AddToGroup)
            .iter()
            .all(|c| c.argument.as_deref() != Some("C")));
    }

    #[tokio::test]
    async fn delete_guards_before_touching_directory() {
        let directory = seeded(&[("boss@corp.io", &[ADMINS_GROUP])]);
        let cancel = CancellationToken::new();
        let service = service(&directory);

        assert_eq!(
            service.delete(&admin(), None, &cancel).await.unwrap(),
            DeleteOutcome::Denied(DenyReason::MissingTarget)
        );
        assert_eq!(
            service
                .delete(&admin(), Some(" BOSS@corp.io"), &cancel)
                .await
                .unwrap(),
            DeleteOutcome::Denied(DenyReason::CannotDeleteSelf)
        );
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_refuses_admin_targets() {
        let directory = seeded(&[("other-admin@corp.io", &[ADMINS_GROUP])]);
        let cancel = CancellationToken::new();

        let outcome = service(&directory)
            .delete(&admin(), Some("other-admin@corp.io"), &cancel)
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Denied(DenyReason::TargetIsAdmin));
        assert!(directory.account("other-admin@corp.io").is_some());
        assert_eq!(directory.mutation_count(), 0);
    }

    #[tokio::test]
    async fn delete_removes_account_and_tolerates_absence() {
        let directory = seeded(&[("ann@example.com", &["USERS"])]);
        let cancel = CancellationToken::new();
        let service = service(&directory);

        assert_eq!(
            service
                .delete(&admin(), Some("ann@example.com"), &cancel)
                .await
                .unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(directory.account("ann@example.com").is_none());

        assert_eq!(
            service
                .delete(&admin(), Some("ann@example.com"), &cancel)
                .await
                .unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn delete_fails_closed_when_groups_unknown() {
        let directory = seeded(&[("ann@example.com", &[])]);
        directory.fail(Primitive::ListGroups, None);
        let cancel = CancellationToken::new();

        let err = service(&directory)
            .delete(&admin(), Some("ann@example.com"), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::DeleteFailed(_)));
        assert!(directory.account("ann@example.com").is_some());
        assert!(directory.calls_to(Primitive::DeleteAccount).is_empty());
    }

    #[tokio::test]
    async fn delete_provider_failure_is_reported() {
        let directory = seeded(&[("ann@example.com", &[])]);
        directory.fail(Primitive::DeleteAccount, None);
        let cancel = CancellationToken::new();

        let err = service(&directory)
            .delete(&admin(), Some("ann@example.com"), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::DeleteFailed(_)));
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let directory = seeded(&[]);
        let cancel = CancellationToken::new();
        let service = service(&directory);

        service
            .create(
                CreateAccountRequest {
                    email: "Jane.Doe@Example.com".into(),
                    groups: vec!["USERS".into()],
                },
                &cancel,
            )
            .await
            .unwrap();

        let rows = service.list(Some("jane"), &cancel).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "jane.doe@example.com");
        assert!(rows[0].groups.contains("USERS"));

        let outcome = service
            .update(
                UpdateAccountRequest {
                    disable: true,
                    add_groups: vec!["OPS".into()],
                    remove_groups: vec!["USERS".into()],
                    ..update("jane.doe@example.com")
                },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(outcome.groups, BTreeSet::from(["OPS".to_string()]));

        let fetched = service
            .get("jane.doe@example.com", &cancel)
            .await
            .unwrap()
            .unwrap();
        assert!(!fetched.enabled);

        assert_eq!(
            service
                .delete(&admin(), Some("jane.doe@example.com"), &cancel)
                .await
                .unwrap(),
            DeleteOutcome::Deleted
        );
        assert!(service
            .get("jane.doe@example.com", &cancel)
            .await
            .unwrap()
            .is_none());
    }
}
