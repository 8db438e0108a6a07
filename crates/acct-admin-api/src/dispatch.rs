//! Per-operation dispatch strategy.
//!
//! Each admin operation is either served locally against the directory or
//! forwarded to a separately deployed endpoint. The choice is made once at
//! startup and never changes while the server runs.

use std::collections::HashMap;
use std::fmt;

use reqwest::Url;
use thiserror::Error;

/// Admin operations exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `POST /admin/create-user`
    CreateUser,
    /// `POST /admin/list-users`
    ListUsers,
    /// `POST /admin/get-user`
    GetUser,
    /// `POST /admin/update-user`
    UpdateUser,
    /// `POST /admin/delete-user`
    DeleteUser,
}

impl Operation {
    /// All operations.
    pub const ALL: [Self; 5] = [
        Self::CreateUser,
        Self::ListUsers,
        Self::GetUser,
        Self::UpdateUser,
        Self::DeleteUser,
    ];

    /// Route name, as used in the path.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateUser => "create-user",
            Self::ListUsers => "list-users",
            Self::GetUser => "get-user",
            Self::UpdateUser => "update-user",
            Self::DeleteUser => "delete-user",
        }
    }

    /// Route path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::CreateUser => "/admin/create-user",
            Self::ListUsers => "/admin/list-users",
            Self::GetUser => "/admin/get-user",
            Self::UpdateUser => "/admin/update-user",
            Self::DeleteUser => "/admin/delete-user",
        }
    }

    /// Key fragment used by the remote endpoint settings (`CREATE_USER`, ...).
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::CreateUser => "CREATE_USER",
            Self::ListUsers => "LIST_USERS",
            Self::GetUser => "GET_USER",
            Self::UpdateUser => "UPDATE_USER",
            Self::DeleteUser => "DELETE_USER",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors building the dispatch table.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Remote endpoint is not an absolute http(s) URL.
    #[error("Invalid remote URL for {operation}: {reason}")]
    InvalidUrl {
        /// Operation being configured.
        operation: Operation,
        /// What is wrong with the URL.
        reason: String,
    },
}

/// Remote endpoint an operation is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    url: Url,
}

impl RemoteEndpoint {
    /// Parses an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidUrl` for anything else.
    pub fn parse(operation: Operation, raw: &str) -> Result<Self, DispatchError> {
        let url = Url::parse(raw.trim()).map_err(|e| DispatchError::InvalidUrl {
            operation,
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DispatchError::InvalidUrl {
                operation,
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(Self { url })
    }

    /// Returns the URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.url, f)
    }
}

/// How one operation is served.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// Served in process.
    #[default]
    Local,
    /// Forwarded verbatim.
    Remote(RemoteEndpoint),
}

/// Dispatch strategy for every operation. Operations not listed are local.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    remote: HashMap<Operation, Dispatch>,
}

impl DispatchTable {
    /// Creates a table where every operation is local.
    #[must_use]
    pub fn local() -> Self {
        Self::default()
    }

    /// Builds a table from optional remote URLs, looked up per operation.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidUrl` for a malformed URL.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, DispatchError>
    where
        F: FnMut(Operation) -> Option<String>,
    {
        let mut table = Self::local();
        for operation in Operation::ALL {
            if let Some(raw) = lookup(operation).filter(|v| !v.trim().is_empty()) {
                table = table.with_remote(operation, RemoteEndpoint::parse(operation, &raw)?);
            }
        }
        Ok(table)
    }

    /// Forwards `operation` to `endpoint`.
    #[must_use]
    pub fn with_remote(mut self, operation: Operation, endpoint: RemoteEndpoint) -> Self {
        self.remote.insert(operation, Dispatch::Remote(endpoint));
        self
    }

    /// Returns the strategy for `operation`.
    #[must_use]
    pub fn get(&self, operation: Operation) -> &Dispatch {
        const LOCAL: &Dispatch = &Dispatch::Local;
        self.remote.get(&operation).unwrap_or(LOCAL)
    }

    /// Returns `true` if at least one operation is forwarded.
    #[must_use]
    pub fn has_remote(&self) -> bool {
        !self.remote.is_empty()
    }
}
