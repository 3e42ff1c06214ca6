//! Chat message model. Messages live in a per-workout subcollection and are
//! append-only: no edit or delete path exists.

use serde::{Deserialize, Serialize};

/// A single chat message under `workoutChats/{workout}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Document ID (populated on reads, not persisted as a field; empty
    /// until the insert assigns one, so it is skipped when empty)
    #[serde(alias = "_firestore_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Message text
    pub text: String,
    /// Author's user ID
    pub author_id: String,
    /// Author display name at send time
    pub author_name: String,
    /// Author avatar URL at send time
    pub author_avatar: Option<String>,
    /// When the message was sent (RFC3339)
    pub created_at: String,
}
