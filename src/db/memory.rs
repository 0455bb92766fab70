// SPDX-License-Identifier: MIT

//! In-memory directory and thread stores.
//!
//! Backs tests and local development with the same trait surface and
//! change-feed semantics as the Firestore stores.

use crate::db::{DirectoryStore, ThreadStore, CHANGE_FEED_CAPACITY};
use crate::error::AppError;
use crate::models::{ChatThread, UserProfile};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// In-memory store implementing both [`DirectoryStore`] and [`ThreadStore`].
#[derive(Clone)]
pub struct MemoryChatDb {
    profiles: Arc<DashMap<String, UserProfile>>,
    threads: Arc<RwLock<Vec<ChatThread>>>,
    changes: broadcast::Sender<ChatThread>,
}

impl MemoryChatDb {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            profiles: Arc::new(DashMap::new()),
            threads: Arc::new(RwLock::new(Vec::new())),
            changes,
        }
    }

    /// Number of stored threads (test observability).
    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }

    /// Number of live change-feed receivers (test observability).
    pub fn feed_subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }
}

impl Default for MemoryChatDb {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DirectoryStore for MemoryChatDb {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.get(user_id).map(|p| p.value().clone()))
    }

    async fn upsert(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn find_by_phone_number(&self, phone: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self
            .profiles
            .iter()
            .find(|entry| entry.value().phone_number == phone)
            .map(|entry| entry.value().clone()))
    }
}

#[async_trait::async_trait]
impl ThreadStore for MemoryChatDb {
    async fn find_by_participant_pair(
        &self,
        phone_a: &str,
        phone_b: &str,
    ) -> Result<Option<ChatThread>, AppError> {
        Ok(self
            .threads
            .read()
            .await
            .iter()
            .find(|t| t.matches_phone_pair(phone_a, phone_b))
            .cloned())
    }

    async fn threads_for_participant(&self, user_id: &str) -> Result<Vec<ChatThread>, AppError> {
        Ok(self
            .threads
            .read()
            .await
            .iter()
            .filter(|t| t.involves(user_id))
            .cloned()
            .collect())
    }

    async fn insert(&self, thread: &ChatThread) -> Result<(), AppError> {
        {
            let mut threads = self.threads.write().await;
            // Upsert by thread id, matching the document-store semantics.
            if let Some(existing) = threads.iter_mut().find(|t| t.thread_id == thread.thread_id) {
                *existing = thread.clone();
            } else {
                threads.push(thread.clone());
            }
        }
        let _ = self.changes.send(thread.clone());
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChatThread> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatParticipant;

    fn profile(user_id: &str, phone: &str) -> UserProfile {
        UserProfile {
            user_id: user_id.to_string(),
            name: format!("User {user_id}"),
            phone_number: phone.to_string(),
            image_url: None,
        }
    }

    fn thread(id: &str, a: &UserProfile, b: &UserProfile) -> ChatThread {
        ChatThread {
            thread_id: id.to_string(),
            participant_a: ChatParticipant::from(a),
            participant_b: ChatParticipant::from(b),
        }
    }

    #[tokio::test]
    async fn test_directory_lookup_by_phone() {
        let db = MemoryChatDb::new();
        db.upsert(&profile("u1", "5551234")).await.unwrap();

        let found = db.find_by_phone_number("5551234").await.unwrap();
        assert_eq!(found.map(|p| p.user_id), Some("u1".to_string()));

        assert!(db.find_by_phone_number("0000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pair_lookup_is_order_independent() {
        let db = MemoryChatDb::new();
        let (u1, u2) = (profile("u1", "5551234"), profile("u2", "5555678"));
        db.insert(&thread("t1", &u1, &u2)).await.unwrap();

        let forward = db
            .find_by_participant_pair("5551234", "5555678")
            .await
            .unwrap();
        let reverse = db
            .find_by_participant_pair("5555678", "5551234")
            .await
            .unwrap();
        assert_eq!(forward.map(|t| t.thread_id), Some("t1".to_string()));
        assert_eq!(reverse.map(|t| t.thread_id), Some("t1".to_string()));
    }

    #[tokio::test]
    async fn test_insert_publishes_on_change_feed() {
        let db = MemoryChatDb::new();
        let mut rx = db.changes();

        let (u1, u2) = (profile("u1", "5551234"), profile("u2", "5555678"));
        db.insert(&thread("t1", &u1, &u2)).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.thread_id, "t1");
    }

    #[tokio::test]
    async fn test_insert_same_id_replaces() {
        let db = MemoryChatDb::new();
        let (u1, u2) = (profile("u1", "5551234"), profile("u2", "5555678"));
        db.insert(&thread("t1", &u1, &u2)).await.unwrap();
        db.insert(&thread("t1", &u1, &u2)).await.unwrap();
        assert_eq!(db.thread_count().await, 1);
    }
}
