//! Best-effort group enrichment.
//!
//! Attaches group memberships to accounts read from the directory. A failed
//! lookup leaves the account with no groups instead of failing the read.

use acct_directory::DirectoryProvider;
use acct_model::Account;
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::call::CallContext;
use crate::error::LifecycleResult;

/// Enriches one account.
///
/// Only cancellation propagates; any directory failure yields empty groups.
pub(crate) async fn enrich(
    directory: &dyn DirectoryProvider,
    ctx: CallContext<'_>,
    mut account: Account,
) -> LifecycleResult<Account> {
    match ctx
        .run("list_groups", directory.list_groups(&account.username))
        .await?
    {
        Ok(groups) => account.groups = groups,
        Err(err) => {
            tracing::warn!(
                username = %account.username,
                error = %err,
                "Group lookup failed; returning account without groups"
            );
            account.groups.clear();
        }
    }
    Ok(account)
}

/// Enriches many accounts with at most `concurrency` lookups in flight.
///
/// The output keeps the order of `accounts`.
pub(crate) async fn enrich_all(
    directory: &dyn DirectoryProvider,
    ctx: CallContext<'_>,
    accounts: Vec<Account>,
    concurrency: usize,
) -> LifecycleResult<Vec<Account>> {
    stream::iter(accounts)
        .map(|account| enrich(directory, ctx, account))
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::Duration;

    use acct_directory::{DirectoryResult, InMemoryDirectory, NewAccount, Primitive};
    use acct_model::SearchPrefix;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio_util::sync::CancellationToken;

    use super::*;

    /// Answers group lookups after a per-account delay and records the order
    /// in which they finish.
    struct StaggeredDirectory {
        inner: InMemoryDirectory,
        delays: Vec<(&'static str, Duration)>,
        finished: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DirectoryProvider for StaggeredDirectory {
        async fn create_account(&self, account: &NewAccount) -> DirectoryResult<()> {
            self.inner.create_account(account).await
        }

        async fn get_account(&self, username: &str) -> DirectoryResult<Option<Account>> {
            self.inner.get_account(username).await
        }

        async fn list_accounts(
            &self,
            filter: Option<&SearchPrefix>,
            limit: usize,
        ) -> DirectoryResult<Vec<Account>> {
            self.inner.list_accounts(filter, limit).await
        }

        async fn set_enabled(&self, username: &str, enabled: bool) -> DirectoryResult<()> {
            self.inner.set_enabled(username, enabled).await
        }

        async fn add_to_group(&self, username: &str, group: &str) -> DirectoryResult<()> {
            self.inner.add_to_group(username, group).await
        }

        async fn remove_from_group(&self, username: &str, group: &str) -> DirectoryResult<()> {
            self.inner.remove_from_group(username, group).await
        }

        async fn list_groups(&self, username: &str) -> DirectoryResult<BTreeSet<String>> {
            let delay = self
                .delays
                .iter()
                .find(|(name, _)| *name == username)
                .map_or(Duration::ZERO, |(_, delay)| *delay);
            tokio::time::sleep(delay).await;
            let result = self.inner.list_groups(username).await;
            self.finished.lock().push(username.to_string());
            result
        }

        async fn delete_account(&self, username: &str) -> DirectoryResult<()> {
            self.inner.delete_account(username).await
        }
    }

    fn directory() -> InMemoryDirectory {
        let directory = InMemoryDirectory::new();
        for (username, group) in [("a@x.io", "USERS"), ("b@x.io", "OPS"), ("c@x.io", "USERS")] {
            let mut account = Account::new(username);
            account.groups.insert(group.to_string());
            directory.insert(account);
        }
        directory
    }

    fn bases() -> Vec<Account> {
        ["a@x.io", "b@x.io", "c@x.io"].into_iter().map(Account::new).collect()
    }

    #[tokio::test]
    async fn failed_lookup_keeps_account_with_no_groups() {
        let directory = directory();
        directory.fail(Primitive::ListGroups, Some("b@x.io"));
        let cancel = CancellationToken::new();
        let ctx = CallContext::new(&cancel, Duration::from_secs(1));

        let enriched = enrich_all(&directory, ctx, bases(), 2).await.unwrap();

        let names: Vec<_> = enriched.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, ["a@x.io", "b@x.io", "c@x.io"]);
        assert!(enriched[0].groups.contains("USERS"));
        assert!(enriched[1].groups.is_empty());
        assert!(enriched[2].groups.contains("USERS"));
    }

    #[tokio::test(start_paused = true)]
    async fn order_survives_out_of_order_lookups() {
        let directory = directory();
        directory.fail(Primitive::ListGroups, Some("b@x.io"));
        let directory = StaggeredDirectory {
            inner: directory,
            delays: vec![
                ("a@x.io", Duration::from_millis(300)),
                ("b@x.io", Duration::from_millis(200)),
                ("c@x.io", Duration::from_millis(100)),
            ],
            finished: Mutex::new(Vec::new()),
        };
        let cancel = CancellationToken::new();
        let ctx = CallContext::new(&cancel, Duration::from_secs(1));

        let enriched = enrich_all(&directory, ctx, bases(), 3).await.unwrap();

        assert_eq!(*directory.finished.lock(), ["c@x.io", "b@x.io", "a@x.io"]);
        let names: Vec<_> = enriched.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, ["a@x.io", "b@x.io", "c@x.io"]);
        assert!(enriched[0].groups.contains("USERS"));
        assert!(enriched[1].groups.is_empty());
        assert!(enriched[2].groups.contains("USERS"));
    }

    #[tokio::test]
    async fn cancellation_propagates() {
        let directory = directory();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = CallContext::new(&cancel, Duration::from_secs(1));

        let err = enrich(&directory, ctx, Account::new("a@x.io")).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(directory.calls().is_empty());
    }
}
