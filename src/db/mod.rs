// SPDX-License-Identifier: MIT

//! Storage layer: directory and thread stores.
//!
//! The sync core talks to storage through the [`DirectoryStore`] and
//! [`ThreadStore`] traits so the Firestore backend and the in-memory
//! backend (tests, local dev) are interchangeable.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreChatDb;
pub use memory::MemoryChatDb;

use crate::error::AppError;
use crate::models::{ChatThread, UserProfile};
use tokio::sync::broadcast;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CHATS: &str = "chats";
}

/// Change-feed capacity. A lagged receiver falls back to a full
/// re-query, so this only bounds burst absorption.
pub const CHANGE_FEED_CAPACITY: usize = 256;

/// Profile storage keyed by user id, queryable by phone number.
#[async_trait::async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Fetch a profile by its stable user id.
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;

    /// Create or replace a profile document.
    async fn upsert(&self, profile: &UserProfile) -> Result<(), AppError>;

    /// Look up the profile registered under a phone number, if any.
    async fn find_by_phone_number(&self, phone: &str) -> Result<Option<UserProfile>, AppError>;
}

/// Persistent chat-thread collection with a live change feed.
#[async_trait::async_trait]
pub trait ThreadStore: Send + Sync {
    /// Find the thread connecting an unordered pair of phone numbers.
    async fn find_by_participant_pair(
        &self,
        phone_a: &str,
        phone_b: &str,
    ) -> Result<Option<ChatThread>, AppError>;

    /// All threads where the user is either participant.
    async fn threads_for_participant(&self, user_id: &str) -> Result<Vec<ChatThread>, AppError>;

    /// Persist a newly created thread. Publishes the thread on the
    /// change feed after the write succeeds.
    async fn insert(&self, thread: &ChatThread) -> Result<(), AppError>;

    /// Subscribe to the change feed of upserted threads.
    ///
    /// Receivers see every thread written after the call; each event
    /// carries the full document.
    fn changes(&self) -> broadcast::Receiver<ChatThread>;
}
