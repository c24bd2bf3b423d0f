use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::users::repo::RepoError;

/// Errors surfaced by handlers. Each maps to one status and one stable `code`;
/// clients match on `code`, the message is for humans.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("user not found")]
    NotFound,

    // Same message for unknown email and wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid user identifier")]
    InvalidIdentifier,

    #[error("{0}")]
    Validation(String),

    #[error("missing or invalid session token")]
    Unauthorized,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidIdentifier | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::NotFound => "NOT_FOUND",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidIdentifier => "INVALID_IDENTIFIER",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Unauthorized => "UNAUTHENTICATED",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::DuplicateEmail => AppError::DuplicateEmail,
            RepoError::NotFound => AppError::NotFound,
            RepoError::Database(e) => AppError::Internal(anyhow::Error::new(e).context("database")),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// `Json` extractor whose rejections use the same error body as everything else.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = serde_json::json!({
            "code": self.code(),
            "error": message,
        });
        (status, Json(body)).into_response()
    }
}
