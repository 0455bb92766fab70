// SPDX-License-Identifier: MIT

//! HTTP status mapping for the error taxonomy.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chitchat_server::error::{AppError, AuthError};

fn status_of(err: AppError) -> StatusCode {
    err.into_response().status()
}

#[test]
fn test_core_error_statuses() {
    assert_eq!(
        status_of(AppError::InvalidInput("bad number".to_string())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AppError::TargetNotRegistered("5559999".to_string())),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(AppError::Persistence("write failed".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_of(AppError::Subscription("listener down".to_string())),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_auth_error_statuses() {
    assert_eq!(
        status_of(AuthError::EmptyField("Email").into()),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AuthError::WeakPassword.into()),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AuthError::DuplicateAccount.into()),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_of(AuthError::InvalidCredentials.into()),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        status_of(AuthError::Gateway("upstream 500".to_string()).into()),
        StatusCode::BAD_GATEWAY
    );
}

#[test]
fn test_auth_error_messages() {
    assert_eq!(
        AuthError::EmptyField("Name").to_string(),
        "Name can't be empty"
    );
    assert_eq!(
        AuthError::WeakPassword.to_string(),
        "Password length must be at least 6 characters"
    );
}
