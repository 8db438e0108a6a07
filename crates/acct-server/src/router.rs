//! Router configuration.
//!
//! This module creates the main Axum router that combines all endpoints.

use acct_admin_api::{admin_router, AdminState, Dispatch, Operation};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

/// Creates the main application router.
pub fn create_router(config: &ServerConfig, state: AdminState) -> Router {
    let status = ServiceStatus {
        directory: config.directory_backend.as_str(),
        remote_operations: Operation::ALL
            .into_iter()
            .filter(|op| matches!(state.dispatch.get(*op), Dispatch::Remote(_)))
            .map(Operation::name)
            .collect(),
    };

    let health = Router::new()
        .route("/health", get(move || health_check(status.clone())))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check));

    let admin = admin_router().with_state(state);

    Router::new()
        .merge(health)
        .merge(admin)
        .route("/", get(root))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Root endpoint handler.
async fn root() -> Json<ServerInfo> {
    Json(ServerInfo {
        name: "Account Admin Service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(flatten)]
    service: ServiceStatus,
}

/// Startup-resolved wiring reported by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    directory: &'static str,
    remote_operations: Vec<&'static str>,
}

/// Server information response.
#[derive(Serialize)]
pub struct ServerInfo {
    name: String,
    version: String,
}

/// Reports liveness plus the directory backend and forwarded operations.
async fn health_check(service: ServiceStatus) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service,
    })
}

/// Kubernetes liveness probe.
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe. The directory is reached lazily, so the
/// server is ready once it is listening.
async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
