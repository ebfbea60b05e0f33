use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use validator::ValidationErrors;

use crate::database::StoreError;
use crate::infrastructure::UpstreamError;
use crate::result::error_response;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, String>,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Your account has been blocked")]
    AccountBlocked,

    #[error("Please verify your email first")]
    EmailNotVerified,

    #[error("Email is already verified")]
    AlreadyVerified,

    #[error("Invalid or expired token")]
    TokenInvalid,

    #[error("Upstream service failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Database error: {0}")]
    Database(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    /// 单字段校验失败
    pub fn invalid_field(field: &str, message: &str) -> Self {
        AppError::Validation {
            message: "Invalid request body".into(),
            errors: BTreeMap::from([(field.to_string(), message.to_string())]),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. }
            | AppError::BadRequest(_)
            | AppError::Duplicate(_)
            | AppError::InvalidCredentials
            | AppError::AccountBlocked
            | AppError::EmailNotVerified
            | AppError::AlreadyVerified
            | AppError::TokenInvalid => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let errors = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errs)| {
                errs.first().map(|err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    (field.to_string(), message)
                })
            })
            .collect();

        AppError::Validation {
            message: "Invalid request body".into(),
            errors,
        }
    }
}

/// 唯一约束冲突对外表现为重复实体
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => AppError::Duplicate(message),
            other => AppError::Database(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection);
        AppError::BadRequest("Invalid request body".into())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("token signing failed: {}", err))
    }
}

#[derive(Serialize)]
struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, errors) = match self {
            AppError::Validation { message, errors } => (message, Some(errors)),
            AppError::Upstream(e) => {
                tracing::error!("Upstream error: {}", e);
                ("External service unavailable".to_string(), None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                ("Internal server error".to_string(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        (status, error_response(message, ErrorDetails { errors })).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
