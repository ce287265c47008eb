use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;
use tokio::task::spawn_blocking;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::AuthError,
    storage::{kv::KeyValueStore, read_or_none, USERS_KEY},
    utils::clock::Clock,
};

use super::{normalize_email, CredentialRecord, User};

pub const DEMO_USER_ID: &str = "demo-user-1";
pub const DEMO_EMAIL: &str = "demo@dasho.com";
pub const DEMO_PASSWORD: &str = "demo123";
pub const DEMO_DISPLAY_NAME: &str = "Demo User";

type Credentials = BTreeMap<String, CredentialRecord>;

/// Owns every account. All accounts live in one JSON mapping under [USERS_KEY] keyed by
/// lowercased email, so the whole mapping is rewritten on each sign up.
pub struct CredentialStore<S> {
    store: S,
    clock: Arc<dyn Clock>,
    hash_cost: u32,
}

impl<S: KeyValueStore> CredentialStore<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, hash_cost: u32) -> Self {
        Self {
            store,
            clock,
            hash_cost,
        }
    }

    /// A corrupted mapping is treated as empty.
    async fn load(&self) -> Result<Credentials> {
        Ok(read_or_none(&self.store, USERS_KEY).await?.unwrap_or_default())
    }

    async fn persist(&self, credentials: &Credentials) -> Result<()> {
        let payload = serde_json::to_string(credentials)?;
        self.store.set(USERS_KEY, &payload).await
    }

    async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.hash_cost;
        Ok(spawn_blocking(move || bcrypt::hash(password, cost)).await??)
    }

    /// Inserts the demo account when there are no accounts at all. Returns whether it did.
    pub async fn ensure_seed_user(&self) -> Result<bool> {
        let mut credentials = self.load().await?;
        if !credentials.is_empty() {
            return Ok(false);
        }

        let record = CredentialRecord {
            user: User {
                id: DEMO_USER_ID.to_string(),
                email: DEMO_EMAIL.to_string(),
                display_name: Some(DEMO_DISPLAY_NAME.to_string()),
                created_at: self.clock.time(),
            },
            password_hash: self.hash(DEMO_PASSWORD).await?,
        };
        credentials.insert(DEMO_EMAIL.to_string(), record);
        self.persist(&credentials).await?;
        info!("Seeded demo account {DEMO_EMAIL}");
        Ok(true)
    }

    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, AuthError> {
        let key = normalize_email(email);
        let mut credentials = self.load().await?;
        if credentials.contains_key(&key) {
            return Err(AuthError::DuplicateUser(key));
        }

        let display_name = display_name.trim();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: key.clone(),
            display_name: (!display_name.is_empty()).then(|| display_name.to_string()),
            created_at: self.clock.time(),
        };
        let record = CredentialRecord {
            user: user.clone(),
            password_hash: self.hash(password).await?,
        };
        credentials.insert(key, record);
        self.persist(&credentials).await?;

        info!("Created account {} for {}", user.id, user.email);
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let key = normalize_email(email);
        let Some(record) = self.load().await?.remove(&key) else {
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = record.password_hash.clone();
        let verified = spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(anyhow::Error::from)?;
        match verified {
            Ok(true) => Ok(record.user),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(e) => {
                warn!("Stored password hash for {key} is unusable: {e}");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    pub async fn find(&self, email: &str) -> Result<Option<User>> {
        let key = normalize_email(email);
        Ok(self.load().await?.remove(&key).map(|v| v.user))
    }
}
