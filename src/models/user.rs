//! User model
//!
//! The identity record behind signup, sign-in and Google login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user.
///
/// Serialized with the field names the dashboard already consumes
/// (`_id`, `isAdmin`, `profilePicture`, ...). The password hash is never
/// serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (UUID v4)
    #[serde(rename = "_id")]
    pub id: String,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// bcrypt hash of the password
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Administrator flag
    #[serde(default)]
    pub is_admin: bool,
    /// Profile picture URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, non-admin user with a fresh id.
    ///
    /// The password must already be hashed; see `services::password::hash_password`.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            is_admin: false,
            profile_picture: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a profile picture
    pub fn with_profile_picture(mut self, url: Option<String>) -> Self {
        self.profile_picture = url.filter(|u| !u.trim().is_empty());
        self
    }
}

/// Which unique column a duplicate insert collided with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Username,
    Email,
}

impl std::fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Username => write!(f, "username"),
            Self::Email => write!(f, "email"),
        }
    }
}
