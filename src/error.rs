// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Credential-flow failures reported by the identity gateway or by
/// pre-flight validation of a sign-up/sign-in submission.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    #[error("{0} can't be empty")]
    EmptyField(&'static str),

    #[error("Password length must be at least 6 characters")]
    WeakPassword,

    #[error("An account already exists for this email or number")]
    DuplicateAccount,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Identity gateway error: {0}")]
    Gateway(String),
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Number not registered: {0}")]
    TargetNotRegistered(String),

    #[error("Store write failed: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Live query error: {0}")]
    Subscription(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_input", Some(msg.clone()))
            }
            AppError::TargetNotRegistered(msg) => (
                StatusCode::NOT_FOUND,
                "target_not_registered",
                Some(msg.clone()),
            ),
            AppError::Persistence(msg) => {
                tracing::error!(error = %msg, "Store write failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Subscription(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "subscription_error",
                Some(msg.clone()),
            ),
            AppError::Auth(err) => {
                let status = match err {
                    AuthError::DuplicateAccount => StatusCode::CONFLICT,
                    AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                    AuthError::Gateway(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, "auth_error", Some(err.to_string()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
