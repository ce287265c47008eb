//! Error types shared across dasho.

/// Errors surfaced to whoever is signing in or up.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password. Try demo@dasho.com / demo123 or sign up for a new account.")]
    InvalidCredentials,

    #[error("User {0} already exists")]
    DuplicateUser(String),

    #[error("Nobody is signed in. Use `dasho signin` or `dasho signup` first.")]
    NotSignedIn,

    #[error("Credential storage failed: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Errors produced while editing a loaded daily log.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("No activity with id {0} in this log")]
    UnknownActivity(String),

    #[error("Value {value} of activity {id} is not a finite number")]
    NonFiniteValue { id: String, value: f64 },
}

/// Stored JSON that couldn't be parsed. Never surfaced to users, callers fall back to defaults.
#[derive(Debug, thiserror::Error)]
#[error("Value under {key} is corrupted: {source}")]
pub struct StorageParseError {
    pub key: String,
    #[source]
    pub source: serde_json::Error,
}
