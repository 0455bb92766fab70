// SPDX-License-Identifier: MIT

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::ChatThread;
use crate::routes::auth::UserResponse;
use crate::AppState;
use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/chats", get(get_chats).post(request_chat))
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .directory
        .get(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile.into()))
}

#[derive(Deserialize)]
pub struct UpdateProfileBody {
    pub name: String,
    pub number: String,
    pub image_url: Option<String>,
}

/// Update the current user's profile.
///
/// Participant snapshots embedded in existing threads keep the old
/// values; only the directory document changes.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .sessions
        .create_or_update_profile(&user.user_id, &body.name, &body.number, body.image_url)
        .await?;

    Ok(Json(profile.into()))
}

// ─── Chat Threads ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RequestChatBody {
    /// Target phone number (digits only)
    pub number: String,
}

/// Open or create the thread with the user behind a phone number.
async fn request_chat(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<RequestChatBody>,
) -> Result<Json<ChatThread>> {
    let requester = state
        .directory
        .get(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    let thread = state.resolver.request_thread(&requester, &body.number).await?;
    Ok(Json(thread))
}

#[derive(serde::Serialize)]
pub struct ChatsResponse {
    pub threads: Vec<ChatThread>,
    pub loading: bool,
}

/// Current live-view snapshot for the signed-in user.
///
/// A valid JWT without a server-side session (instance restart) lazily
/// re-establishes one; the controller guard keeps that idempotent.
async fn get_chats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ChatsResponse>> {
    let controller = match state.sessions.session(&user.user_id) {
        Some(controller) => controller,
        None => {
            let profile = state
                .directory
                .get(&user.user_id)
                .await?
                .ok_or(AppError::Unauthorized)?;
            state.sessions.establish(profile).await
        }
    };

    let view = controller.snapshot();
    Ok(Json(ChatsResponse {
        threads: view.threads,
        loading: view.loading,
    }))
}
