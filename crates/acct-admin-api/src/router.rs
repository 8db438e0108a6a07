//! Admin API router configuration.
//!
//! One `POST` route per operation. Each handler first consults the dispatch
//! table: remote operations are relayed without being inspected, local ones
//! are authenticated, parsed against their strict schema and run.

use std::future::Future;

use acct_lifecycle::{CreateOutcome, DeleteOutcome, LifecycleError};
use acct_model::{normalize_username, Caller};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::auth::authenticate_admin;
use crate::dispatch::{Dispatch, Operation};
use crate::dto::{
    CreateUserRequest, CreateUserResponse, DeleteUserRequest, DeleteUserResponse, GetUserRequest,
    GetUserResponse, ListUsersRequest, ListUsersResponse, UpdateUserRequest, UpdateUserResponse,
    UserRow,
};
use crate::error::{AdminError, AdminResult};
use crate::events::{record, AdminEvent, AdminEventKind};
use crate::state::AdminState;

type RawBody = Result<Bytes, BytesRejection>;

// ============================================================================
// Dispatch
// ============================================================================

/// Serves `operation` remotely or locally, per the dispatch table.
async fn serve<T, F, Fut>(
    state: AdminState,
    operation: Operation,
    headers: HeaderMap,
    body: RawBody,
    local: F,
) -> Response
where
    T: DeserializeOwned + Default,
    F: FnOnce(AdminState, Caller, T, CancellationToken) -> Fut,
    Fut: Future<Output = AdminResult<Response>>,
{
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return AdminError::from(rejection).into_response(),
    };

    if let Dispatch::Remote(endpoint) = state.dispatch.get(operation) {
        tracing::debug!(operation = %operation, url = %endpoint, "Forwarding to remote endpoint");
        return state
            .proxy
            .forward(endpoint, &headers, body)
            .await
            .into_response();
    }

    tracing::debug!(operation = %operation, "Serving locally");
    serve_local(state, &headers, &body, local)
        .await
        .into_response()
}

async fn serve_local<T, F, Fut>(
    state: AdminState,
    headers: &HeaderMap,
    body: &Bytes,
    local: F,
) -> AdminResult<Response>
where
    T: DeserializeOwned + Default,
    F: FnOnce(AdminState, Caller, T, CancellationToken) -> Fut,
    Fut: Future<Output = AdminResult<Response>>,
{
    let caller = authenticate_admin(state.validator.as_ref(), headers).await?;
    let request = parse_body::<T>(headers, body)?;
    let cancel = state.shutdown.child_token();
    local(state, caller, request, cancel).await
}

/// Parses a JSON body. An empty body is the schema's default.
fn parse_body<T: DeserializeOwned + Default>(headers: &HeaderMap, body: &Bytes) -> AdminResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    if !is_json(headers) {
        return Err(AdminError::UnsupportedMediaType);
    }
    serde_json::from_slice(body).map_err(|e| AdminError::InvalidRequest(e.to_string()))
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /admin/create-user
async fn create_user(State(state): State<AdminState>, headers: HeaderMap, body: RawBody) -> Response {
    serve(state, Operation::CreateUser, headers, body, local_create_user).await
}

async fn local_create_user(
    state: AdminState,
    caller: Caller,
    request: CreateUserRequest,
    cancel: CancellationToken,
) -> AdminResult<Response> {
    let outcome = match state.lifecycle.create(request.into(), &cancel).await {
        Ok(outcome) => outcome,
        Err(LifecycleError::Cancelled {
            created: Some(username),
            applied,
        }) => {
            let event = AdminEvent::new(AdminEventKind::UserCreated, &caller, &username)
                .detail("groups", applied.applied_summary().join(","))
                .failure("cancelled");
            record(state.events.as_ref(), event).await;
            return Err(LifecycleError::Cancelled {
                created: Some(username),
                applied,
            }
            .into());
        }
        Err(err) => return Err(err.into()),
    };

    let response = match outcome {
        CreateOutcome::Created { username, groups } => {
            let mut event = AdminEvent::new(AdminEventKind::UserCreated, &caller, &username)
                .detail("groups", groups.applied_summary().join(","));
            if groups.has_failures() {
                let failed: Vec<_> = groups.failed.iter().map(|f| f.change.to_string()).collect();
                event = event.detail("failed_groups", failed.join(","));
            }
            record(state.events.as_ref(), event).await;
            CreateUserResponse::created(username)
        }
        CreateOutcome::AlreadyExists { username } => {
            let event = AdminEvent::new(AdminEventKind::UserCreateSkipped, &caller, username);
            record(state.events.as_ref(), event).await;
            CreateUserResponse::exists()
        }
    };
    Ok(Json(response).into_response())
}

/// POST /admin/list-users
async fn list_users(State(state): State<AdminState>, headers: HeaderMap, body: RawBody) -> Response {
    serve(state, Operation::ListUsers, headers, body, local_list_users).await
}

async fn local_list_users(
    state: AdminState,
    _caller: Caller,
    request: ListUsersRequest,
    cancel: CancellationToken,
) -> AdminResult<Response> {
    let accounts = state
        .lifecycle
        .list(request.search.as_deref(), &cancel)
        .await?;
    let users = accounts.into_iter().map(UserRow::from).collect();
    Ok(Json(ListUsersResponse { users }).into_response())
}

/// POST /admin/get-user
async fn get_user(State(state): State<AdminState>, headers: HeaderMap, body: RawBody) -> Response {
    serve(state, Operation::GetUser, headers, body, local_get_user).await
}

async fn local_get_user(
    state: AdminState,
    _caller: Caller,
    request: GetUserRequest,
    cancel: CancellationToken,
) -> AdminResult<Response> {
    let username = request.username.as_deref().unwrap_or_default();
    let account = state.lifecycle.get(username, &cancel).await?;
    Ok(Json(GetUserResponse {
        user: account.map(UserRow::from),
    })
    .into_response())
}

/// POST /admin/update-user
async fn update_user(State(state): State<AdminState>, headers: HeaderMap, body: RawBody) -> Response {
    serve(state, Operation::UpdateUser, headers, body, local_update_user).await
}

async fn local_update_user(
    state: AdminState,
    caller: Caller,
    request: UpdateUserRequest,
    cancel: CancellationToken,
) -> AdminResult<Response> {
    let target = normalize_username(request.username.as_deref().unwrap_or_default());
    let outcome = match state.lifecycle.update(request.into(), &cancel).await {
        Ok(outcome) => outcome,
        Err(LifecycleError::Cancelled { created, applied }) => {
            let event = AdminEvent::new(AdminEventKind::UserUpdated, &caller, &target)
                .detail("groups", applied.applied_summary().join(","))
                .failure("cancelled");
            record(state.events.as_ref(), event).await;
            return Err(LifecycleError::Cancelled { created, applied }.into());
        }
        Err(err) => return Err(err.into()),
    };

    let mut event = AdminEvent::new(AdminEventKind::UserUpdated, &caller, &outcome.username)
        .detail("groups", outcome.report.applied_summary().join(","));
    if let Some(enabled) = outcome.enabled {
        event = event.detail("enabled", enabled.to_string());
    }
    if outcome.report.has_failures() {
        let failed: Vec<_> = outcome
            .report
            .failed
            .iter()
            .map(|f| f.change.to_string())
            .collect();
        event = event.detail("failed_groups", failed.join(","));
    }
    record(state.events.as_ref(), event).await;

    Ok(Json(UpdateUserResponse {
        ok: true,
        groups: outcome.groups.into_iter().collect(),
    })
    .into_response())
}

/// POST /admin/delete-user
async fn delete_user(State(state): State<AdminState>, headers: HeaderMap, body: RawBody) -> Response {
    serve(state, Operation::DeleteUser, headers, body, local_delete_user).await
}

async fn local_delete_user(
    state: AdminState,
    caller: Caller,
    request: DeleteUserRequest,
    cancel: CancellationToken,
) -> AdminResult<Response> {
    let target = request.sub.as_deref();
    let target_name = target.unwrap_or_default().trim().to_lowercase();

    let (response, event) = match state.lifecycle.delete(&caller, target, &cancel).await {
        Ok(DeleteOutcome::Deleted) => (
            DeleteUserResponse::deleted(),
            AdminEvent::new(AdminEventKind::UserDeleted, &caller, &target_name),
        ),
        Ok(DeleteOutcome::NotFound) => (
            DeleteUserResponse::not_found(),
            AdminEvent::new(AdminEventKind::UserDeleted, &caller, &target_name)
                .detail("reason", "not_found"),
        ),
        Ok(DeleteOutcome::Denied(reason)) => (
            DeleteUserResponse::denied(reason),
            AdminEvent::new(AdminEventKind::UserDeleteDenied, &caller, &target_name)
                .failure(reason.as_str()),
        ),
        Err(LifecycleError::DeleteFailed(err)) => {
            tracing::error!(username = %target_name, error = %err, "Delete failed");
            (
                DeleteUserResponse::failed(),
                AdminEvent::new(AdminEventKind::UserDeleted, &caller, &target_name)
                    .failure("delete_failed"),
            )
        }
        Err(other) => return Err(other.into()),
    };

    record(state.events.as_ref(), event).await;
    Ok(response.into_response())
}

// ============================================================================
// Router Construction
// ============================================================================

/// Creates the admin router.
///
/// # Routes
///
/// - `POST /admin/create-user`
/// - `POST /admin/list-users`
/// - `POST /admin/get-user`
/// - `POST /admin/update-user`
/// - `POST /admin/delete-user`
pub fn admin_router() -> Router<AdminState> {
    Router::new()
        .route(Operation::CreateUser.path(), post(create_user))
        .route(Operation::ListUsers.path(), post(list_users))
        .route(Operation::GetUser.path(), post(get_user))
        .route(Operation::UpdateUser.path(), post(update_user))
        .route(Operation::DeleteUser.path(), post(delete_user))
}
