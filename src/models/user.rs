//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Subscription tier. `Basic` is subject to the monthly workout quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Basic,
    Premium,
}

impl Plan {
    pub fn is_premium(self) -> bool {
        matches!(self, Plan::Premium)
    }
}

/// User profile stored in Firestore, keyed by the identity provider subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Identity provider subject (also used as document ID)
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Avatar URL
    pub avatar_url: Option<String>,
    /// Subscription tier
    #[serde(default)]
    pub plan: Plan,
    /// When the user first signed in (RFC3339)
    pub created_at: String,
    /// Last sign-in timestamp (RFC3339)
    pub last_active: String,
}
