//! # acct-model
//!
//! Domain types for the admin user lifecycle service: directory accounts,
//! group names, validated search prefixes and the authenticated caller.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod account;
pub mod caller;
pub mod group;
pub mod search;

pub use account::{
    normalize_username, Account, AccountStatus, ATTR_EMAIL, ATTR_EMAIL_VERIFIED,
    ATTR_FAMILY_NAME, ATTR_GIVEN_NAME,
};
pub use caller::Caller;
pub use group::{normalize_group_names, ADMINS_GROUP};
pub use search::{SearchPrefix, MAX_SEARCH_LEN};
