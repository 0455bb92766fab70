// SPDX-License-Identifier: MIT

//! Firestore-backed directory and thread stores.
//!
//! Wraps the Firestore client with typed operations for:
//! - Users (profile storage, lookup by phone number)
//! - Chats (thread records keyed by thread id)
//!
//! The change feed is an in-process broadcast bus fed after each
//! successful write. That is sufficient for a single server instance;
//! a multi-instance deployment would need Firestore listen targets.

use crate::db::{collections, DirectoryStore, ThreadStore, CHANGE_FEED_CAPACITY};
use crate::error::AppError;
use crate::models::{ChatThread, UserProfile};
use tokio::sync::broadcast;

/// Firestore database client for the chat collections.
#[derive(Clone)]
pub struct FirestoreChatDb {
    client: Option<firestore::FirestoreDb>,
    changes: broadcast::Sender<ChatThread>,
}

impl FirestoreChatDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Ok(Self {
            client: Some(client),
            changes,
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Ok(Self {
            client: Some(client),
            changes,
        })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            client: None,
            changes,
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait::async_trait]
impl DirectoryStore for FirestoreChatDb {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.user_id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn find_by_phone_number(&self, phone: &str) -> Result<Option<UserProfile>, AppError> {
        let phone = phone.to_string();
        let matches: Vec<UserProfile> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("phone_number").eq(phone.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.into_iter().next())
    }
}

#[async_trait::async_trait]
impl ThreadStore for FirestoreChatDb {
    async fn find_by_participant_pair(
        &self,
        phone_a: &str,
        phone_b: &str,
    ) -> Result<Option<ChatThread>, AppError> {
        let (phone_a, phone_b) = (phone_a.to_string(), phone_b.to_string());
        let matches: Vec<ChatThread> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CHATS)
            .filter(move |q| {
                q.for_any([
                    q.for_all([
                        q.field("participant_a.phone_number").eq(phone_a.clone()),
                        q.field("participant_b.phone_number").eq(phone_b.clone()),
                    ]),
                    q.for_all([
                        q.field("participant_a.phone_number").eq(phone_b.clone()),
                        q.field("participant_b.phone_number").eq(phone_a.clone()),
                    ]),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.into_iter().next())
    }

    async fn threads_for_participant(&self, user_id: &str) -> Result<Vec<ChatThread>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHATS)
            .filter(move |q| {
                q.for_any([
                    q.field("participant_a.user_id").eq(user_id.clone()),
                    q.field("participant_b.user_id").eq(user_id.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert(&self, thread: &ChatThread) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHATS)
            .document_id(&thread.thread_id)
            .object(thread)
            .execute()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        // Publish only after the write is durable. A send error just
        // means no subscriber is listening right now.
        let _ = self.changes.send(thread.clone());
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChatThread> {
        self.changes.subscribe()
    }
}
