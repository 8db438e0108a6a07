//! # acct-admin-api
//!
//! HTTP admin API for the user lifecycle service.
//!
//! ## Modules
//!
//! - [`auth`] - Bearer token validation and the administrator gate
//! - [`dispatch`] - Local or remote strategy per operation
//! - [`dto`] - Request and response bodies
//! - [`error`] - Error types and HTTP error responses
//! - [`events`] - Audit events
//! - [`proxy`] - Verbatim forwarding to remote endpoints
//! - [`router`] - Axum router and HTTP handlers
//! - [`state`] - Application state
//!
//! ## Quick Start
//!
//! ```ignore
//! use acct_admin_api::{admin_router, AdminState, JwtConfig, JwtTokenValidator, ProxyClient};
//!
//! let validator = JwtTokenValidator::new(JwtConfig::hs256(secret))?;
//! let state = AdminState::new(lifecycle, Arc::new(validator), ProxyClient::new(timeout)?);
//! let app = admin_router().with_state(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! ## API Endpoints
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | POST | `/admin/create-user` | `{email, groups?}` |
//! | POST | `/admin/list-users` | `{search?}` or empty |
//! | POST | `/admin/get-user` | `{username}` |
//! | POST | `/admin/update-user` | `{username, enable?, disable?, addGroups?, removeGroups?}` |
//! | POST | `/admin/delete-user` | `{sub}` |

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod dispatch;
pub mod dto;
pub mod error;
pub mod events;
pub mod proxy;
pub mod router;
pub mod state;

pub use auth::{
    authenticate_admin, JwtConfig, JwtKey, JwtTokenValidator, StaticTokenValidator,
    TokenValidator,
};
pub use dispatch::{Dispatch, DispatchError, DispatchTable, Operation, RemoteEndpoint};
pub use dto::{
    CreateUserRequest, CreateUserResponse, DeleteUserRequest, DeleteUserResponse, GetUserRequest,
    GetUserResponse, ListUsersRequest, ListUsersResponse, UpdateUserRequest, UpdateUserResponse,
    UserRow,
};
pub use error::{AdminError, AdminResult, ErrorResponse};
pub use events::{
    AdminEvent, AdminEventKind, AdminEventLogger, EventLogError, EventOutcome,
    InMemoryEventLogger, TracingEventLogger,
};
pub use proxy::{ProxyClient, DEFAULT_PROXY_TIMEOUT};
pub use router::admin_router;
pub use state::AdminState;
