use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use ledgerly_auth::{AuthError, AuthzError};
use ledgerly_core::DomainError;
use ledgerly_infra::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Everything a handler can fail with. Rendered as `{"error", "message"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Store(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
            ApiError::Auth(err) => auth_error_to_response(err),
            ApiError::Forbidden(err) => json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string()),
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
        }
    }
}

fn domain_error_to_response(err: DomainError) -> Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::InvariantViolation(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", message)
        }
    }
}

fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        StoreError::UniqueViolation(_) | StoreError::StaleWrite(_) => {
            json_error(StatusCode::CONFLICT, "conflict", err.to_string())
        }
        StoreError::ForeignKeyViolation(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_reference", err.to_string())
        }
        other => {
            tracing::error!(error = %other, "store error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal storage error")
        }
    }
}

fn auth_error_to_response(err: AuthError) -> Response {
    match err {
        AuthError::Hashing(_) | AuthError::Issue(_) => {
            tracing::error!(error = %err, "auth backend error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "auth_error", "internal authentication error")
        }
        other => json_error(StatusCode::UNAUTHORIZED, "unauthorized", other.to_string()),
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
