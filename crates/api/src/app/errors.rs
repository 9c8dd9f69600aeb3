use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use folio_auth::{AuthzError, PasswordError, TokenValidationError};
use folio_core::{DomainError, FieldErrors};
use folio_infra::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every failure a handler can report, mapped onto one HTTP status each.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        fields: Option<FieldErrors>,
    },

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthenticated() -> Self {
        Self::Unauthenticated("Authentication credentials were not provided or are invalid.".to_string())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::InvalidId(_) => "invalid_id",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Store(_) => "store_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        match self {
            Self::Validation { message, fields: Some(fields) } => {
                json_error_with_fields(status, code, message, &fields)
            }
            Self::Store(detail) | Self::Internal(detail) => {
                tracing::error!(code, %detail, "request failed");
                json_error(status, code, "internal server error")
            }
            other => json_error(status, code, other.to_string()),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(message) | DomainError::InvariantViolation(message) => {
                Self::Validation { message, fields: None }
            }
            DomainError::Fields(fields) => Self::Validation {
                message: fields.to_string(),
                fields: Some(fields),
            },
            DomainError::InvalidId(msg) => Self::InvalidId(msg),
            DomainError::NotFound => Self::NotFound("not found".to_string()),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Unauthorized => Self::Forbidden("unauthorized".to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        Self::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenValidationError> for ApiError {
    fn from(err: TokenValidationError) -> Self {
        Self::Internal(err.to_string())
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

pub fn json_error_with_fields(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    fields: &FieldErrors,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "fields": fields,
        })),
    )
        .into_response()
}
