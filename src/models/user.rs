// SPDX-License-Identifier: MIT

//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
///
/// The document id in the `users` collection is `user_id`, which is
/// assigned by the identity gateway at sign-up and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable identifier from the identity gateway (also the document ID)
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Phone number (digits only) used for chat discovery
    pub phone_number: String,
    /// Profile picture URL (may be None if never uploaded)
    pub image_url: Option<String>,
}
