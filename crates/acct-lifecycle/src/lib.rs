//! Account lifecycle operations for the admin API.
//!
//! This crate holds the policy of the service, independent of HTTP and of
//! the directory backend:
//!
//! - `validation` - Email shape checks
//! - `guard` - Who may delete whom
//! - `idempotency` - Duplicate create handling
//! - `report` - Best-effort group change outcomes
//! - `service` - The five lifecycle operations
//!
//! Every operation takes a [`CancellationToken`](tokio_util::sync::CancellationToken).
//! Once it fires, no further directory call is started.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod call;
mod enrichment;
pub mod error;
pub mod guard;
pub mod idempotency;
pub mod report;
pub mod service;
pub mod validation;

pub use error::{LifecycleError, LifecycleResult, ValidationError};
pub use guard::{can_delete, DeleteDecision, DenyReason};
pub use idempotency::CreateDecision;
pub use report::{FailedGroupChange, GroupChange, GroupChangeReport};
pub use service::{
    AccountLifecycle, CreateAccountRequest, CreateOutcome, DeleteOutcome, LifecycleConfig,
    UpdateAccountRequest, UpdateOutcome, DEFAULT_LIST_LIMIT,
};
pub use validation::{validate_email, MAX_EMAIL_LENGTH};
