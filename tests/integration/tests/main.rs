//! End-to-end integration tests.
//!
//! These tests run the complete server over HTTP against an in-memory
//! directory.

mod admin_api;
mod proxy;
