//! Local accounts and the signed in session.
//!  - [credentials::CredentialStore] owns the `dasho-users` mapping.
//!  - [session::SessionHolder] owns the `dasho-user` slot and publishes the current user.

pub mod credentials;
pub mod session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user as seen by the rest of the application. Never carries password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name to greet the user with.
    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("User")
    }
}

/// Stored form of an account. Keyed by lowercased email inside the credential mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Emails are compared case-insensitively, so the lowercased form is the identity.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
