// SPDX-License-Identifier: MIT

//! Identity gateway: credential verification and stable user ids.
//!
//! The gateway is a consumed collaborator. [`FirebaseIdentity`] talks to
//! the Google Identity Toolkit REST API; [`InMemoryIdentity`] is the
//! offline double for tests and local development.

use crate::error::AuthError;
use dashmap::DashMap;
use serde::Deserialize;
use uuid::Uuid;

/// Authenticates credentials and issues a stable user identifier.
#[async_trait::async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Create an account; returns the new user id.
    async fn sign_up(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Verify credentials; returns the account's user id.
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, AuthError>;
}

// ─── Identity Toolkit (Firebase Auth) ────────────────────────

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Identity Toolkit REST client.
pub struct FirebaseIdentity {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct SignInResponse {
    #[serde(rename = "localId")]
    local_id: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl FirebaseIdentity {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
        }
    }

    async fn post_credentials(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let url = format!("{}/{}?key={}", IDENTITY_TOOLKIT_URL, endpoint, self.api_key);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| AuthError::Gateway(e.to_string()))?;

        if response.status().is_success() {
            let body: SignInResponse = response
                .json()
                .await
                .map_err(|e| AuthError::Gateway(e.to_string()))?;
            return Ok(body.local_id);
        }

        let status = response.status();
        let message = response
            .json::<ApiErrorBody>()
            .await
            .map(|b| b.error.message)
            .unwrap_or_else(|_| status.to_string());

        Err(map_toolkit_error(&message))
    }
}

/// Map Identity Toolkit error codes onto the auth taxonomy.
///
/// WEAK_PASSWORD arrives as "WEAK_PASSWORD : Password should be ...",
/// so codes are matched by prefix.
fn map_toolkit_error(message: &str) -> AuthError {
    if message.starts_with("EMAIL_EXISTS") {
        AuthError::DuplicateAccount
    } else if message.starts_with("WEAK_PASSWORD") {
        AuthError::WeakPassword
    } else if message.starts_with("EMAIL_NOT_FOUND")
        || message.starts_with("INVALID_PASSWORD")
        || message.starts_with("INVALID_LOGIN_CREDENTIALS")
        || message.starts_with("USER_DISABLED")
    {
        AuthError::InvalidCredentials
    } else {
        AuthError::Gateway(message.to_string())
    }
}

#[async_trait::async_trait]
impl IdentityGateway for FirebaseIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<String, AuthError> {
        self.post_credentials("accounts:signUp", email, password)
            .await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<String, AuthError> {
        self.post_credentials("accounts:signInWithPassword", email, password)
            .await
    }
}

// ─── In-memory gateway ───────────────────────────────────────

/// Offline identity gateway keyed by email.
#[derive(Default)]
pub struct InMemoryIdentity {
    accounts: DashMap<String, Account>,
}

struct Account {
    password: String,
    user_id: String,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl IdentityGateway for InMemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<String, AuthError> {
        if password.len() < 6 {
            return Err(AuthError::WeakPassword);
        }
        if self.accounts.contains_key(email) {
            return Err(AuthError::DuplicateAccount);
        }
        let user_id = Uuid::new_v4().to_string();
        self.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user_id: user_id.clone(),
            },
        );
        Ok(user_id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<String, AuthError> {
        match self.accounts.get(email) {
            Some(account) if account.password == password => Ok(account.user_id.clone()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}
