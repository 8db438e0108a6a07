//! Admin API error types.
//!
//! Maps lifecycle and transport failures to HTTP responses with a
//! `{error, code}` JSON body. `error` is the text shown to admin users.

use acct_lifecycle::{LifecycleError, ValidationError};
use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in the Admin API.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Request failed business validation.
    #[error("{}", .0.message())]
    Validation(ValidationError),

    /// Body is not valid JSON or does not match the schema.
    #[error("Requête invalide: {0}")]
    InvalidRequest(String),

    /// Body sent with a non-JSON content type.
    #[error("Le corps de la requête doit être du JSON")]
    UnsupportedMediaType,

    /// Body exceeds the configured limit.
    #[error("Corps de requête trop volumineux")]
    PayloadTooLarge,

    /// Missing or invalid bearer token.
    #[error("Authentification requise")]
    Unauthorized,

    /// Authenticated caller is not an administrator.
    #[error("Accès réservé aux administrateurs")]
    Forbidden,

    /// Target account does not exist.
    #[error("Utilisateur introuvable")]
    UserNotFound {
        /// Normalized username.
        username: String,
    },

    /// Directory failure on a primary action. Details are logged, not returned.
    #[error("Erreur de l'annuaire")]
    Directory {
        /// Primitive that failed.
        operation: &'static str,
    },

    /// The operation was cancelled before it completed. Carries what had
    /// already reached the directory.
    #[error("Opération interrompue")]
    Cancelled {
        /// Account created before cancellation, if any.
        created: Option<String>,
        /// Applied group changes, as `+GROUP` / `-GROUP`.
        applied: Vec<String>,
        /// Rejected group changes, in the same form.
        failed: Vec<String>,
    },

    /// Forwarding to the remote endpoint failed.
    #[error("Échec du relais: {0}")]
    Proxy(String),

    /// Internal server error.
    #[error("Erreur interne: {0}")]
    Internal(String),
}

impl AdminError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UserNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Directory { .. } | Self::Cancelled { .. } | Self::Proxy(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.code(),
            Self::InvalidRequest(_) => "invalid_request",
            Self::UnsupportedMediaType => "unsupported_media_type",
            Self::PayloadTooLarge => "payload_too_large",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::UserNotFound { .. } => "user_not_found",
            Self::Directory { .. } => "directory_error",
            Self::Cancelled { .. } => "cancelled",
            Self::Proxy(_) => "proxy_failed",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<LifecycleError> for AdminError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(err) => Self::Validation(err),
            LifecycleError::NotFound { username } => Self::UserNotFound { username },
            LifecycleError::Directory { operation, source } => {
                tracing::error!(operation, error = %source, "Directory call failed");
                Self::Directory { operation }
            }
            LifecycleError::DeleteFailed(source) => {
                tracing::error!(error = %source, "Delete failed");
                Self::Directory {
                    operation: "delete_account",
                }
            }
            LifecycleError::Cancelled { created, applied } => {
                tracing::warn!(
                    created = ?created,
                    applied = ?applied.applied_summary(),
                    "Operation cancelled"
                );
                Self::Cancelled {
                    created,
                    applied: applied.applied_summary(),
                    failed: applied.failed_summary(),
                }
            }
        }
    }
}

impl From<BytesRejection> for AdminError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::InvalidRequest(rejection.body_text())
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Message for admin users.
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
    /// Account created before a cancellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Group changes applied before a cancellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied: Option<Vec<String>>,
    /// Group changes rejected before a cancellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<String>>,
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
            created: None,
            applied: None,
            failed: None,
        };
        if let Self::Cancelled {
            created,
            applied,
            failed,
        } = self
        {
            body.created = created;
            body.applied = Some(applied);
            body.failed = Some(failed);
        }
        (status, Json(body)).into_response()
    }
}

/// Result type for Admin API operations.
pub type AdminResult<T> = Result<T, AdminError>;
