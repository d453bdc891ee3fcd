//! Unified application error model and mapping helpers.
//! Services return the typed `ServiceError`; the HTTP edge converts it into
//! `AppError`, which carries a stable `code`, a message and a status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::identity::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("only standard-tier accounts can be promoted")]
    IneligibleForPromotion,
    #[error("account not found")]
    AccountNotFound,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email is already registered")]
    DuplicateContact,
    #[error("{0}")]
    Validation(String),
    #[error("standard-tier accounts may hold at most {limit} todos")]
    QuotaExceeded { limit: usize },
    #[error("todo not found")]
    TodoNotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    Auth { code: String, message: String },
    Forbidden { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::Auth { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Auth { code: err.code().into(), message: err.to_string() }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Token(t) => t.into(),
            ServiceError::IneligibleForPromotion => AppError::forbidden("ineligible_for_promotion".into(), message),
            ServiceError::AccountNotFound => AppError::not_found("account_not_found".into(), message),
            ServiceError::InvalidCredentials => AppError::auth("invalid_credentials".into(), message),
            ServiceError::DuplicateContact => AppError::conflict("duplicate_email".into(), message),
            ServiceError::Validation(_) => AppError::user("invalid_input".into(), message),
            ServiceError::QuotaExceeded { .. } => AppError::forbidden("quota_exceeded".into(), message),
            ServiceError::TodoNotFound => AppError::not_found("todo_not_found".into(), message),
            ServiceError::Internal(detail) => {
                tracing::error!("internal error: {}", detail);
                AppError::internal("internal_error", "internal server error")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "status": "error",
            "code": self.code_str(),
            "message": self.message(),
        });
        (status, Json(body)).into_response()
    }
}
