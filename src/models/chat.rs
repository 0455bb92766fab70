// SPDX-License-Identifier: MIT

//! Chat thread models.

use crate::models::UserProfile;
use serde::{Deserialize, Serialize};

/// Denormalized snapshot of a participant's profile, embedded in a
/// thread at creation time so the chat list renders without a join.
///
/// Snapshots are not refreshed when the underlying profile changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatParticipant {
    pub user_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub phone_number: String,
}

impl From<&UserProfile> for ChatParticipant {
    fn from(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.user_id.clone(),
            name: profile.name.clone(),
            image_url: profile.image_url.clone(),
            phone_number: profile.phone_number.clone(),
        }
    }
}

/// A persistent two-party conversation record.
///
/// `participant_a` is the initiator, but the ordering carries no meaning:
/// exactly one thread exists per unordered pair of user ids, and
/// consumers treat the pair as unordered when finding "the other side".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatThread {
    /// Unique thread id (UUID, also the document ID in `chats`)
    pub thread_id: String,
    pub participant_a: ChatParticipant,
    pub participant_b: ChatParticipant,
}

impl ChatThread {
    /// Whether the given user is one of the two participants.
    pub fn involves(&self, user_id: &str) -> bool {
        self.participant_a.user_id == user_id || self.participant_b.user_id == user_id
    }

    /// Whether this thread connects the given unordered phone-number pair.
    pub fn matches_phone_pair(&self, phone_x: &str, phone_y: &str) -> bool {
        let (a, b) = (
            self.participant_a.phone_number.as_str(),
            self.participant_b.phone_number.as_str(),
        );
        (a == phone_x && b == phone_y) || (a == phone_y && b == phone_x)
    }

    /// The participant that is not `user_id`.
    ///
    /// Returns `participant_b` if `user_id` is not a participant at all;
    /// callers are expected to have checked `involves` first.
    pub fn other_participant(&self, user_id: &str) -> &ChatParticipant {
        if self.participant_a.user_id == user_id {
            &self.participant_b
        } else {
            &self.participant_a
        }
    }
}

/// A single chat message, scoped to a thread and ordered by timestamp.
///
/// Append-only; message routing itself is outside the sync core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sender's user id
    pub sender: String,
    pub body: String,
    /// RFC 3339 timestamp; last write wins per timestamp
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(user_id: &str, phone: &str) -> ChatParticipant {
        ChatParticipant {
            user_id: user_id.to_string(),
            name: format!("User {user_id}"),
            image_url: None,
            phone_number: phone.to_string(),
        }
    }

    fn thread() -> ChatThread {
        ChatThread {
            thread_id: "t1".to_string(),
            participant_a: participant("u1", "5551234"),
            participant_b: participant("u2", "5555678"),
        }
    }

    #[test]
    fn test_involves_both_participants() {
        let t = thread();
        assert!(t.involves("u1"));
        assert!(t.involves("u2"));
        assert!(!t.involves("u3"));
    }

    #[test]
    fn test_phone_pair_is_unordered() {
        let t = thread();
        assert!(t.matches_phone_pair("5551234", "5555678"));
        assert!(t.matches_phone_pair("5555678", "5551234"));
        assert!(!t.matches_phone_pair("5551234", "5550000"));
    }

    #[test]
    fn test_other_participant() {
        let t = thread();
        assert_eq!(t.other_participant("u1").user_id, "u2");
        assert_eq!(t.other_participant("u2").user_id, "u1");
    }
}
