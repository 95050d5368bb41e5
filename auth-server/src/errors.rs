use crate::cache::CacheError;
use crate::store::StoreError;
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use log::{error, warn};
use serde_json::json;
use thiserror::Error;
use token_engine::{AuthError, RepositoryError};

#[derive(Debug, Clone)]
pub struct ApiError {
    pub detail: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a detail message and status code
    pub fn new<S: ToString>(detail: S, status_code: StatusCode) -> Self {
        Self {
            detail: detail.to_string(),
            status_code,
        }
    }

    /// Not Found (404)
    pub fn not_found<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::NOT_FOUND)
    }
}

/// HTTP status for an engine error.
///
/// Every credential failure shares one status so callers cannot tell a bad
/// signature from an expired or malformed token.
pub(crate) fn status_for(error: &AuthError) -> StatusCode {
    match error {
        AuthError::MalformedScope(_)
        | AuthError::UnknownAccessLevel(_)
        | AuthError::MissingUser
        | AuthError::MissingScope => StatusCode::BAD_REQUEST,
        e if e.is_credential_failure() => StatusCode::UNAUTHORIZED,
        AuthError::AccessDenied { .. } | AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        AuthError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        AuthError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log the specific reason behind a response that only carries a generic one
pub(crate) fn log_rejection(error: &AuthError) {
    match status_for(error) {
        status if status.is_server_error() => error!("Request failed ({status}): {error}"),
        status => warn!("Request rejected ({status}): {error}"),
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        log_rejection(&error);
        let status_code = status_for(&error);
        let detail = match status_code {
            StatusCode::BAD_REQUEST => error.to_string(),
            StatusCode::UNAUTHORIZED => "Unauthenticated".to_string(),
            StatusCode::FORBIDDEN => "Permission denied".to_string(),
            StatusCode::GATEWAY_TIMEOUT => "Upstream call timed out".to_string(),
            StatusCode::SERVICE_UNAVAILABLE => "Request cancelled".to_string(),
            _ => "Internal server error".to_string(),
        };
        Self::new(detail, status_code)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code;
        let body = json!({
            "detail": self.detail,
        });
        (status_code, Json(body)).into_response()
    }
}

/// Lookups of a record named by the caller: an unknown record is a
/// credential failure, not a server fault.
pub(crate) fn not_found_as_unauthenticated(error: AuthError) -> AuthError {
    match error {
        AuthError::Repository(RepositoryError::NotFound(what)) => {
            warn!("Credential refers to a missing record: {what}");
            AuthError::Unauthenticated
        }
        other => other,
    }
}

/// Failures that abort startup
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}
