//! Admin API state management.

use std::sync::Arc;

use acct_lifecycle::AccountLifecycle;
use tokio_util::sync::CancellationToken;

use crate::auth::TokenValidator;
use crate::dispatch::DispatchTable;
use crate::events::{AdminEventLogger, TracingEventLogger};
use crate::proxy::ProxyClient;

/// Admin API application state.
///
/// Built once at startup; every field is immutable and cheap to clone.
#[derive(Clone)]
pub struct AdminState {
    /// Lifecycle operations.
    pub lifecycle: Arc<AccountLifecycle>,
    /// Bearer token validator.
    pub validator: Arc<dyn TokenValidator>,
    /// Local or remote strategy per operation.
    pub dispatch: Arc<DispatchTable>,
    /// Client for remote operations.
    pub proxy: ProxyClient,
    /// Audit event destination.
    pub events: Arc<dyn AdminEventLogger>,
    /// Cancelled when the server shuts down. Requests run under child tokens.
    pub shutdown: CancellationToken,
}

impl AdminState {
    /// Creates a state with local dispatch, the tracing audit logger and a
    /// fresh shutdown token.
    pub fn new(
        lifecycle: Arc<AccountLifecycle>,
        validator: Arc<dyn TokenValidator>,
        proxy: ProxyClient,
    ) -> Self {
        Self {
            lifecycle,
            validator,
            dispatch: Arc::new(DispatchTable::local()),
            proxy,
            events: Arc::new(TracingEventLogger::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Replaces the dispatch table.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: DispatchTable) -> Self {
        self.dispatch = Arc::new(dispatch);
        self
    }

    /// Replaces the audit logger.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn AdminEventLogger>) -> Self {
        self.events = events;
        self
    }

    /// Uses `token` as the shutdown signal.
    #[must_use]
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }
}

impl std::fmt::Debug for AdminState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminState")
            .field("lifecycle", &self.lifecycle)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}
