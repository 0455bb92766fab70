// SPDX-License-Identifier: MIT

//! Session lifecycle: sign-up/sign-in/sign-out and live-view wiring.
//!
//! [`SessionController`] owns one user's session context and view cell;
//! all transitions for a user are serialized through its mutex.
//! [`SessionManager`] runs the credential flows against the identity
//! gateway and the directory, and keys controllers by user id.

use crate::db::{DirectoryStore, ThreadStore};
use crate::error::{AppError, AuthError, Result};
use crate::models::UserProfile;
use crate::services::live_view::{LiveViewState, LiveViewSynchronizer, SubscriptionHandle};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    /// Credential submission in flight, or live-view wiring in progress.
    Authenticating,
    SignedIn,
}

/// Per-user session context: active profile plus subscription handle.
/// Replaces the ambient mutable profile state of a client-side session
/// with an explicitly owned record.
struct SessionContext {
    state: SessionState,
    profile: Option<UserProfile>,
    subscription: Option<SubscriptionHandle>,
}

/// Tracks one user's sign-in state and live-view subscription.
pub struct SessionController {
    ctx: Mutex<SessionContext>,
    cell: Arc<watch::Sender<LiveViewState>>,
    view: watch::Receiver<LiveViewState>,
    synchronizer: LiveViewSynchronizer,
}

impl SessionController {
    pub fn new(threads: Arc<dyn ThreadStore>) -> Self {
        let (cell, view) = watch::channel(LiveViewState::default());
        Self {
            ctx: Mutex::new(SessionContext {
                state: SessionState::SignedOut,
                profile: None,
                subscription: None,
            }),
            cell: Arc::new(cell),
            view,
            synchronizer: LiveViewSynchronizer::new(threads),
        }
    }

    /// Record the active profile and (re)subscribe its live view.
    ///
    /// Idempotent: a redundant call for the already-subscribed user is
    /// a no-op, so repeated auth-state callbacks never stack a second
    /// subscription.
    pub async fn on_sign_in(&self, profile: UserProfile) {
        let mut ctx = self.ctx.lock().await;

        let already_active = ctx.state == SessionState::SignedIn
            && ctx.subscription.is_some()
            && ctx
                .profile
                .as_ref()
                .is_some_and(|p| p.user_id == profile.user_id);
        if already_active {
            tracing::debug!(user_id = %profile.user_id, "Redundant sign-in, keeping subscription");
            return;
        }

        ctx.state = SessionState::Authenticating;

        // A different user (or a torn-down subscription) on this
        // controller: unwire before rewiring.
        if let Some(handle) = ctx.subscription.take() {
            handle.unsubscribe();
        }
        self.cell.send_replace(LiveViewState::default());

        let handle = self
            .synchronizer
            .subscribe(&profile.user_id, Arc::clone(&self.cell));

        tracing::info!(user_id = %profile.user_id, "Session signed in, live view subscribed");
        ctx.subscription = Some(handle);
        ctx.profile = Some(profile);
        ctx.state = SessionState::SignedIn;
    }

    /// Tear down the subscription and reset the view.
    ///
    /// Safe to call when already signed out.
    pub async fn on_sign_out(&self) {
        let mut ctx = self.ctx.lock().await;

        if let Some(handle) = ctx.subscription.take() {
            tracing::info!(user_id = handle.user_id(), "Session signed out");
            handle.unsubscribe();
        }
        self.cell
            .send_replace(LiveViewState { threads: Vec::new(), loading: false });
        ctx.profile = None;
        ctx.state = SessionState::SignedOut;
    }

    pub async fn state(&self) -> SessionState {
        self.ctx.lock().await.state
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.ctx.lock().await.profile.clone()
    }

    /// Receiver for the reactive view (await-able change notifications).
    pub fn live_view(&self) -> watch::Receiver<LiveViewState> {
        self.view.clone()
    }

    /// Current view contents.
    pub fn snapshot(&self) -> LiveViewState {
        self.view.borrow().clone()
    }
}

/// Request payload for account creation.
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
}

/// Credential flows plus the per-user controller registry.
pub struct SessionManager {
    identity: Arc<dyn crate::services::identity::IdentityGateway>,
    directory: Arc<dyn DirectoryStore>,
    threads: Arc<dyn ThreadStore>,
    sessions: DashMap<String, Arc<SessionController>>,
}

impl SessionManager {
    pub fn new(
        identity: Arc<dyn crate::services::identity::IdentityGateway>,
        directory: Arc<dyn DirectoryStore>,
        threads: Arc<dyn ThreadStore>,
    ) -> Self {
        Self {
            identity,
            directory,
            threads,
            sessions: DashMap::new(),
        }
    }

    /// Create an account: validate, reject duplicate numbers, register
    /// with the gateway, store the profile, and open the session.
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<UserProfile> {
        validate_sign_up(&request)?;

        if self
            .directory
            .find_by_phone_number(&request.phone_number)
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateAccount.into());
        }

        let user_id = self
            .identity
            .sign_up(&request.email, &request.password)
            .await?;

        let profile = UserProfile {
            user_id,
            name: request.name,
            phone_number: request.phone_number,
            image_url: None,
        };
        self.directory.upsert(&profile).await?;

        tracing::info!(user_id = %profile.user_id, "Account created");
        self.establish(profile.clone()).await;
        Ok(profile)
    }

    /// Verify credentials and open the session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile> {
        if email.is_empty() {
            return Err(AuthError::EmptyField("Email").into());
        }
        if password.len() < 6 {
            return Err(AuthError::WeakPassword.into());
        }

        let user_id = self.identity.sign_in(email, password).await?;

        let profile = self
            .directory
            .get(&user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id}")))?;

        self.establish(profile.clone()).await;
        Ok(profile)
    }

    /// Close a session. No-op if none is open for the user.
    pub async fn sign_out(&self, user_id: &str) {
        if let Some((_, controller)) = self.sessions.remove(user_id) {
            controller.on_sign_out().await;
        }
    }

    /// The open session for a user, if any.
    pub fn session(&self, user_id: &str) -> Option<Arc<SessionController>> {
        self.sessions.get(user_id).map(|c| Arc::clone(c.value()))
    }

    /// Get-or-create the controller for a known profile and sign it in.
    /// Redundant establishment is idempotent (controller-level guard).
    pub async fn establish(&self, profile: UserProfile) -> Arc<SessionController> {
        let controller = {
            let entry = self
                .sessions
                .entry(profile.user_id.clone())
                .or_insert_with(|| Arc::new(SessionController::new(Arc::clone(&self.threads))));
            Arc::clone(entry.value())
        };
        controller.on_sign_in(profile).await;
        controller
    }

    /// Create or update a profile document.
    ///
    /// An existing image URL is preserved when none is supplied. The
    /// participant snapshots embedded in existing threads are not
    /// refreshed.
    pub async fn create_or_update_profile(
        &self,
        user_id: &str,
        name: &str,
        phone_number: &str,
        image_url: Option<String>,
    ) -> Result<UserProfile> {
        if name.is_empty() || phone_number.is_empty() {
            return Err(AppError::InvalidInput(
                "Number or name cannot be empty".to_string(),
            ));
        }

        let existing = self.directory.get(user_id).await?;
        let profile = UserProfile {
            user_id: user_id.to_string(),
            name: name.to_string(),
            phone_number: phone_number.to_string(),
            image_url: image_url.or(existing.and_then(|p| p.image_url)),
        };
        self.directory.upsert(&profile).await?;
        Ok(profile)
    }
}

fn validate_sign_up(request: &SignUpRequest) -> std::result::Result<(), AuthError> {
    if request.name.is_empty() {
        return Err(AuthError::EmptyField("Name"));
    }
    if request.phone_number.is_empty() {
        return Err(AuthError::EmptyField("Number"));
    }
    if request.email.is_empty() {
        return Err(AuthError::EmptyField("Email"));
    }
    if request.password.len() < 6 {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SignUpRequest {
        SignUpRequest {
            name: "Uma".to_string(),
            email: "uma@example.com".to_string(),
            phone_number: "5551234".to_string(),
            password: "secret1".to_string(),
        }
    }

    #[test]
    fn test_sign_up_validation_order() {
        let mut r = request();
        r.name.clear();
        assert_eq!(validate_sign_up(&r), Err(AuthError::EmptyField("Name")));

        let mut r = request();
        r.phone_number.clear();
        assert_eq!(validate_sign_up(&r), Err(AuthError::EmptyField("Number")));

        let mut r = request();
        r.email.clear();
        assert_eq!(validate_sign_up(&r), Err(AuthError::EmptyField("Email")));

        let mut r = request();
        r.password = "short".to_string();
        assert_eq!(validate_sign_up(&r), Err(AuthError::WeakPassword));

        assert_eq!(validate_sign_up(&request()), Ok(()));
    }
}
