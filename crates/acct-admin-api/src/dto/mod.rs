//! Data Transfer Objects for the admin API.
//!
//! Request schemas reject unknown fields. Response shapes are what the admin
//! frontend already consumes.

pub mod request;
pub mod response;

pub use request::{
    CreateUserRequest, DeleteUserRequest, GetUserRequest, ListUsersRequest, UpdateUserRequest,
};
pub use response::{
    CreateUserResponse, DeleteUserResponse, GetUserResponse, ListUsersResponse,
    UpdateUserResponse, UserRow,
};
