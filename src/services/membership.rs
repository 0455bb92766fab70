// SPDX-License-Identifier: MIT

//! Membership resolver: find-or-create for chat threads.
//!
//! Handles the core workflow:
//! 1. Validate the target phone number
//! 2. Return the existing thread for the pair, if any
//! 3. Resolve the target user in the directory
//! 4. Create and persist a new thread with embedded snapshots

use crate::db::{DirectoryStore, ThreadStore};
use crate::error::{AppError, Result};
use crate::models::{ChatParticipant, ChatThread, UserProfile};
use std::sync::Arc;
use uuid::Uuid;

/// Resolves a requester plus target phone number to a chat thread.
pub struct MembershipResolver {
    directory: Arc<dyn DirectoryStore>,
    threads: Arc<dyn ThreadStore>,
}

impl MembershipResolver {
    pub fn new(directory: Arc<dyn DirectoryStore>, threads: Arc<dyn ThreadStore>) -> Self {
        Self { directory, threads }
    }

    /// Open-or-create the thread between the requester and the user
    /// registered under `target_phone`.
    ///
    /// Idempotent: if a thread already connects the unordered pair of
    /// phone numbers, that thread is returned and nothing is written.
    /// The check-then-act sequence is not transactional; a concurrent
    /// pair of initiations for the same pair can race (accepted — the
    /// thread id itself is never duplicated).
    pub async fn request_thread(
        &self,
        requester: &UserProfile,
        target_phone: &str,
    ) -> Result<ChatThread> {
        if target_phone.is_empty() || !target_phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::InvalidInput(
                "Invalid number. Please enter a valid phone number consisting of digits only."
                    .to_string(),
            ));
        }
        if target_phone == requester.phone_number {
            return Err(AppError::InvalidInput(
                "You can't start a chat with your own number.".to_string(),
            ));
        }

        // 1. Existing thread for the unordered pair wins.
        if let Some(existing) = self
            .threads
            .find_by_participant_pair(&requester.phone_number, target_phone)
            .await?
        {
            tracing::debug!(
                thread_id = %existing.thread_id,
                "Thread already exists for pair"
            );
            return Ok(existing);
        }

        // 2. The target must be a registered user.
        let target = self
            .directory
            .find_by_phone_number(target_phone)
            .await?
            .ok_or_else(|| AppError::TargetNotRegistered(target_phone.to_string()))?;

        // 3. New thread, initiator first, snapshots taken now.
        let thread = ChatThread {
            thread_id: Uuid::new_v4().to_string(),
            participant_a: ChatParticipant::from(requester),
            participant_b: ChatParticipant::from(&target),
        };

        // 4. Persist; subscribers of both participants observe the
        //    thread via the store's change feed.
        self.threads.insert(&thread).await?;

        tracing::info!(
            thread_id = %thread.thread_id,
            requester = %requester.user_id,
            target = %target.user_id,
            "Chat thread created"
        );

        Ok(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryChatDb;

    fn profile(user_id: &str, phone: &str) -> UserProfile {
        UserProfile {
            user_id: user_id.to_string(),
            name: format!("User {user_id}"),
            phone_number: phone.to_string(),
            image_url: None,
        }
    }

    fn resolver(db: &MemoryChatDb) -> MembershipResolver {
        MembershipResolver::new(Arc::new(db.clone()), Arc::new(db.clone()))
    }

    #[tokio::test]
    async fn test_rejects_non_digit_number() {
        let db = MemoryChatDb::new();
        let u1 = profile("u1", "5551234");

        for bad in ["", "555-1234", "abc", "555 1234"] {
            let err = resolver(&db).request_thread(&u1, bad).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "input: {bad:?}");
        }
    }

    #[tokio::test]
    async fn test_rejects_own_number() {
        let db = MemoryChatDb::new();
        let u1 = profile("u1", "5551234");
        crate::db::DirectoryStore::upsert(&db, &u1).await.unwrap();

        let err = resolver(&db)
            .request_thread(&u1, "5551234")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unregistered_target() {
        let db = MemoryChatDb::new();
        let u1 = profile("u1", "5551234");

        let err = resolver(&db)
            .request_thread(&u1, "5559999")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TargetNotRegistered(_)));
    }

    #[tokio::test]
    async fn test_creates_with_initiator_first() {
        let db = MemoryChatDb::new();
        let (u1, u2) = (profile("u1", "5551234"), profile("u2", "5555678"));
        crate::db::DirectoryStore::upsert(&db, &u2).await.unwrap();

        let thread = resolver(&db).request_thread(&u1, "5555678").await.unwrap();
        assert_eq!(thread.participant_a.user_id, "u1");
        assert_eq!(thread.participant_b.user_id, "u2");
        assert_eq!(db.thread_count().await, 1);
    }

    #[tokio::test]
    async fn test_retry_returns_same_thread() {
        let db = MemoryChatDb::new();
        let (u1, u2) = (profile("u1", "5551234"), profile("u2", "5555678"));
        crate::db::DirectoryStore::upsert(&db, &u2).await.unwrap();

        let first = resolver(&db).request_thread(&u1, "5555678").await.unwrap();
        let second = resolver(&db).request_thread(&u1, "5555678").await.unwrap();
        assert_eq!(first.thread_id, second.thread_id);
        assert_eq!(db.thread_count().await, 1);
    }

    #[tokio::test]
    async fn test_reverse_direction_is_idempotent() {
        let db = MemoryChatDb::new();
        let (u1, u2) = (profile("u1", "5551234"), profile("u2", "5555678"));
        crate::db::DirectoryStore::upsert(&db, &u1).await.unwrap();
        crate::db::DirectoryStore::upsert(&db, &u2).await.unwrap();

        let forward = resolver(&db).request_thread(&u1, "5555678").await.unwrap();
        let reverse = resolver(&db).request_thread(&u2, "5551234").await.unwrap();
        assert_eq!(forward.thread_id, reverse.thread_id);
        assert_eq!(db.thread_count().await, 1);
    }
}
