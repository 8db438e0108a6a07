//! Audit events for admin operations.
//!
//! Every locally served mutation produces one [`AdminEvent`]. The production
//! logger writes them to the `audit` tracing target.

use std::collections::BTreeMap;
use std::fmt;

use acct_model::Caller;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// Event Types
// ============================================================================

/// Kind of audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminEventKind {
    /// Account created.
    UserCreated,
    /// Create was a no-op on an existing account.
    UserCreateSkipped,
    /// Enabled flag or groups changed.
    UserUpdated,
    /// Account deleted, or already absent.
    UserDeleted,
    /// Delete refused by the guard.
    UserDeleteDenied,
}

impl fmt::Display for AdminEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UserCreated => "USER_CREATED",
            Self::UserCreateSkipped => "USER_CREATE_SKIPPED",
            Self::UserUpdated => "USER_UPDATED",
            Self::UserDeleted => "USER_DELETED",
            Self::UserDeleteDenied => "USER_DELETE_DENIED",
        };
        f.write_str(name)
    }
}

/// Whether the audited action succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    /// Completed.
    Success,
    /// Refused or failed.
    Failure,
}

/// One audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AdminEvent {
    /// Event ID.
    pub id: Uuid,
    /// When the event was recorded.
    pub time: DateTime<Utc>,
    /// Audited action.
    pub kind: AdminEventKind,
    /// Caller username.
    pub actor: String,
    /// Target username.
    pub target: String,
    /// Outcome.
    pub outcome: EventOutcome,
    /// Extra context.
    pub details: BTreeMap<String, String>,
}

impl AdminEvent {
    /// Starts a successful event of `kind` by `caller` on `target`.
    #[must_use]
    pub fn new(kind: AdminEventKind, caller: &Caller, target: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            time: Utc::now(),
            kind,
            actor: caller.username.clone(),
            target: target.into(),
            outcome: EventOutcome::Success,
            details: BTreeMap::new(),
        }
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Marks the event as failed.
    #[must_use]
    pub fn failure(mut self, reason: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.details.insert("reason".to_string(), reason.into());
        self
    }
}

// ============================================================================
// Event Logger Trait
// ============================================================================

/// Errors that can occur during event logging.
#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Destination for audit events.
#[async_trait]
pub trait AdminEventLogger: Send + Sync {
    /// Logs an admin event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be logged.
    async fn log(&self, event: AdminEvent) -> Result<(), EventLogError>;
}

// ============================================================================
// Tracing Logger
// ============================================================================

/// Writes events to the `audit` tracing target at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventLogger;

impl TracingEventLogger {
    /// Creates a new tracing logger.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AdminEventLogger for TracingEventLogger {
    async fn log(&self, event: AdminEvent) -> Result<(), EventLogError> {
        let details = serde_json::to_string(&event.details)?;
        tracing::info!(
            target: "audit",
            event_id = %event.id,
            kind = %event.kind,
            actor = %event.actor,
            target_user = %event.target,
            outcome = ?event.outcome,
            details = %details,
            "admin_event"
        );
        Ok(())
    }
}

// ============================================================================
// In-Memory Logger (for testing)
// ============================================================================

/// Keeps events in memory for assertions.
#[derive(Debug, Default)]
pub struct InMemoryEventLogger {
    events: RwLock<Vec<AdminEvent>>,
}

impl InMemoryEventLogger {
    /// Creates a new in-memory logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all logged events.
    #[must_use]
    pub fn events(&self) -> Vec<AdminEvent> {
        self.events.read().clone()
    }

    /// Returns the kinds of all logged events, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<AdminEventKind> {
        self.events.read().iter().map(|e| e.kind).collect()
    }

    /// Clears all logged events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl AdminEventLogger for InMemoryEventLogger {
    async fn log(&self, event: AdminEvent) -> Result<(), EventLogError> {
        self.events.write().push(event);
        Ok(())
    }
}

/// Logs `event`, downgrading a logger failure to a warning.
pub async fn record(logger: &dyn AdminEventLogger, event: AdminEvent) {
    let kind = event.kind;
    if let Err(e) = logger.log(event).await {
        tracing::warn!(kind = %kind, error = %e, "Failed to write audit event");
    }
}
