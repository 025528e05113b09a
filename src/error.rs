// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Every domain operation returns these as typed results; the HTTP layer
/// maps them to status codes here and callers never see raw store errors.
#[derive(Debug)]
pub enum AppError {
    // 409 Conflict
    DuplicateEmail(String),

    // 400 Bad Request
    WeakPassword(String),

    // 401 Unauthorized
    InvalidCredentials,

    // 404 Not Found
    NotFound(String),

    // 409 Conflict: deletion blocked by dependent rows
    HasDependents(String),

    // 400 Bad Request: submitted answers don't match the quiz
    InvalidAnswerSet(String),

    // 409 Conflict: a score for this (user, quiz) already exists
    AlreadySubmitted,

    // 403 Forbidden: authorization policy denied the action
    Forbidden,

    // 400 Bad Request: malformed input
    BadRequest(String),

    // 500 Internal Server Error: the store failed us
    StorageUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::DuplicateEmail(email) => (
                StatusCode::CONFLICT,
                format!("Email '{}' is already registered", email),
            ),
            AppError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::HasDependents(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidAnswerSet(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AlreadySubmitted => (
                StatusCode::CONFLICT,
                "A score for this quiz has already been submitted".to_string(),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::StorageUnavailable(msg) => {
                tracing::error!("Storage unavailable: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::StorageUnavailable`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// True when the error is a violated UNIQUE constraint, which the services
/// translate into `DuplicateEmail` or `AlreadySubmitted`.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
