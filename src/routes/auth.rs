// SPDX-License-Identifier: MIT

//! Sign-up / sign-in / sign-out routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, SESSION_COOKIE};
use crate::models::UserProfile;
use crate::services::SignUpRequest;
use crate::AppState;
use axum::{extract::State, routing::post, Extension, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
}

/// Routes that need an authenticated session (wired up with the auth
/// middleware in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/signout", post(sign_out))
}

/// Profile as returned to the UI.
#[derive(Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub name: String,
    pub phone_number: String,
    pub image_url: Option<String>,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            user_id: profile.user_id,
            name: profile.name,
            phone_number: profile.phone_number,
            image_url: profile.image_url,
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct SignUpBody {
    #[validate(length(min = 1, message = "Name can't be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Number can't be empty"))]
    pub number: String,
    pub password: String,
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SignUpBody>,
) -> Result<(CookieJar, Json<UserResponse>)> {
    body.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let profile = state
        .sessions
        .sign_up(SignUpRequest {
            name: body.name,
            email: body.email,
            phone_number: body.number,
            password: body.password,
        })
        .await?;

    let jar = set_session_cookie(jar, &profile.user_id, &state.config.jwt_signing_key)?;
    Ok((jar, Json(profile.into())))
}

#[derive(Deserialize)]
pub struct SignInBody {
    pub email: String,
    pub password: String,
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SignInBody>,
) -> Result<(CookieJar, Json<UserResponse>)> {
    let profile = state.sessions.sign_in(&body.email, &body.password).await?;

    let jar = set_session_cookie(jar, &profile.user_id, &state.config.jwt_signing_key)?;
    Ok((jar, Json(profile.into())))
}

async fn sign_out(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    state.sessions.sign_out(&user.user_id).await;

    let jar = jar.remove(Cookie::from(SESSION_COOKIE));
    Ok((jar, Json(serde_json::json!({ "success": true }))))
}

fn set_session_cookie(jar: CookieJar, user_id: &str, signing_key: &[u8]) -> Result<CookieJar> {
    let token = create_jwt(user_id, signing_key)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok(jar.add(cookie))
}
