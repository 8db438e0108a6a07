//! # acct-directory
//!
//! Directory adapter for the admin user lifecycle service.
//!
//! [`DirectoryProvider`] is the only seam through which the service talks to
//! the identity provider. Two implementations ship with the crate:
//!
//! - [`CognitoDirectory`] - Amazon Cognito user pool admin API
//! - [`InMemoryDirectory`] - in-process directory for development and tests

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cognito;
pub mod error;
pub mod memory;
pub mod provider;

pub use cognito::{CognitoConfig, CognitoDirectory};
pub use error::{DirectoryError, DirectoryResult};
pub use memory::{DirectoryCall, InMemoryDirectory, Primitive};
pub use provider::{DeliveryMedium, DirectoryProvider, NewAccount};
