// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod chat;
pub mod user;

pub use chat::{ChatParticipant, ChatThread, Message};
pub use user::UserProfile;
