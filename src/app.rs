use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::{
    activity::{aggregate::Aggregator, store::DailyLogStore},
    auth::{credentials::CredentialStore, session::SessionHolder},
    config::{AuthSettings, Config},
    storage::kv::{FileStore, KeyValueStore},
    utils::clock::{Clock, DefaultClock},
};

/// Everything a front end needs, wired to a single store. Built once at startup and passed
/// around explicitly.
pub struct Dasho<S> {
    pub session: SessionHolder<S>,
    pub logs: Arc<DailyLogStore<S>>,
    pub aggregator: Aggregator<S>,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore + Clone> Dasho<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, auth: AuthSettings) -> Self {
        let credentials = CredentialStore::new(store.clone(), clock.clone(), auth.hash_cost);
        let session = SessionHolder::new(store.clone(), credentials, clock.clone(), auth.latency);
        let logs = Arc::new(DailyLogStore::new(store, clock.clone()));
        let aggregator = Aggregator::new(logs.clone(), clock.clone());
        Self {
            session,
            logs,
            aggregator,
            clock,
        }
    }

    /// Seeds the demo account on a new store and restores the previous session.
    pub async fn init(&self) -> Result<()> {
        if self.session.credentials().ensure_seed_user().await? {
            info!("Initialized a new store");
        }
        self.session.restore().await;
        Ok(())
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

impl Dasho<Arc<FileStore>> {
    /// Opens the file store under the configured directory and initializes it.
    pub async fn open(config: &Config) -> Result<Self> {
        let store = Arc::new(FileStore::new(config.store_dir())?);
        let app = Self::new(store, Arc::new(DefaultClock), config.auth);
        app.init().await?;
        Ok(app)
    }
}
