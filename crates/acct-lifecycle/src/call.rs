//! Bounded directory calls.

use std::future::Future;
use std::time::Duration;

use acct_directory::{DirectoryError, DirectoryResult};
use tokio_util::sync::CancellationToken;

use crate::error::{LifecycleError, LifecycleResult};

/// Runs directory calls under a deadline and a cancellation token.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallContext<'a> {
    cancel: &'a CancellationToken,
    timeout: Duration,
}

impl<'a> CallContext<'a> {
    pub(crate) const fn new(cancel: &'a CancellationToken, timeout: Duration) -> Self {
        Self { cancel, timeout }
    }

    /// Awaits `call` unless the token fires first.
    ///
    /// The outer error is cancellation only. An elapsed deadline is reported
    /// as `DirectoryError::Timeout` in the inner result. A cancelled call is
    /// abandoned, never retried.
    pub(crate) async fn run<T, F>(
        &self,
        operation: &'static str,
        call: F,
    ) -> LifecycleResult<DirectoryResult<T>>
    where
        F: Future<Output = DirectoryResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(LifecycleError::cancelled());
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(LifecycleError::cancelled()),
            outcome = tokio::time::timeout(self.timeout, call) => {
                Ok(outcome.unwrap_or(Err(DirectoryError::Timeout { operation })))
            }
        }
    }
}
