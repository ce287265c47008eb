use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    error::AuthError,
    storage::{kv::KeyValueStore, parse_value, SESSION_KEY},
    utils::clock::Clock,
};

use super::{credentials::CredentialStore, User};

/// What observers of the session see. `loading` is only set while the session is being
/// restored and while a sign in or sign up is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
}

/// Holds the signed in user and keeps the `dasho-user` slot in sync with it.
pub struct SessionHolder<S> {
    store: S,
    credentials: CredentialStore<S>,
    clock: Arc<dyn Clock>,
    latency: Duration,
    state: watch::Sender<SessionState>,
}

impl<S: KeyValueStore> SessionHolder<S> {
    /// Sessions start out loading until [SessionHolder::restore] runs.
    pub fn new(
        store: S,
        credentials: CredentialStore<S>,
        clock: Arc<dyn Clock>,
        latency: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SessionState {
            user: None,
            loading: true,
        });
        Self {
            store,
            credentials,
            clock,
            latency,
            state,
        }
    }

    pub fn credentials(&self) -> &CredentialStore<S> {
        &self.credentials
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    fn publish(&self, user: Option<User>, loading: bool) {
        self.state.send_modify(|state| {
            state.user = user;
            state.loading = loading;
        });
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_modify(|state| state.loading = loading);
    }

    /// Restores the session persisted by a previous run. Never fails: unreadable or
    /// corrupted slots leave the session empty, and corrupted ones are cleared.
    pub async fn restore(&self) -> Option<User> {
        self.set_loading(true);
        let user = match self.store.get(SESSION_KEY).await {
            Ok(Some(raw)) => match parse_value::<User>(SESSION_KEY, &raw) {
                Ok(user) => {
                    debug!("Restored session of {}", user.email);
                    Some(user)
                }
                Err(e) => {
                    warn!("Dropping session: {e}");
                    if let Err(e) = self.store.remove(SESSION_KEY).await {
                        error!("Failed to clear corrupted session {e:?}");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!("Failed to read session {e:?}");
                None
            }
        };
        self.publish(user.clone(), false);
        user
    }

    async fn establish(&self, user: User) -> Result<User, AuthError> {
        let payload = serde_json::to_string(&user).map_err(anyhow::Error::from)?;
        self.store.set(SESSION_KEY, &payload).await?;
        info!("Signed in as {}", user.email);
        self.publish(Some(user.clone()), false);
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.set_loading(true);
        self.clock.sleep(self.latency).await;
        let result = match self.credentials.sign_in(email, password).await {
            Ok(user) => self.establish(user).await,
            Err(e) => Err(e),
        };
        self.set_loading(false);
        result
    }

    /// Creates the account and signs straight into it.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, AuthError> {
        self.set_loading(true);
        self.clock.sleep(self.latency).await;
        let result = match self.credentials.sign_up(email, password, display_name).await {
            Ok(user) => self.establish(user).await,
            Err(e) => Err(e),
        };
        self.set_loading(false);
        result
    }

    /// The in-memory session is dropped even if the persisted slot can't be removed.
    pub async fn sign_out(&self) -> Result<()> {
        if let Some(user) = self.current() {
            info!("Signing out {}", user.email);
        }
        self.publish(None, false);
        self.store.remove(SESSION_KEY).await
    }

    pub fn require_user(&self) -> Result<User, AuthError> {
        self.current().ok_or(AuthError::NotSignedIn)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex, OnceLock},
        time::Duration,
    };

    use anyhow::Result;
    use chrono::NaiveDate;
    use tokio::sync::watch;

    use crate::{
        auth::credentials::{CredentialStore, DEMO_EMAIL, DEMO_PASSWORD},
        error::AuthError,
        storage::{kv::KeyValueStore, memory::MemoryStore, SESSION_KEY},
        utils::clock::{testing::fixed_clock, Clock, MockClock},
    };

    use super::{SessionHolder, SessionState};

    fn holder_with_clock(
        store: Arc<MemoryStore>,
        clock: Arc<dyn Clock>,
    ) -> SessionHolder<Arc<MemoryStore>> {
        let credentials = CredentialStore::new(store.clone(), clock.clone(), 4);
        SessionHolder::new(store, credentials, clock, Duration::from_secs(1))
    }

    fn holder(store: Arc<MemoryStore>) -> SessionHolder<Arc<MemoryStore>> {
        let clock = fixed_clock(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        holder_with_clock(store, Arc::new(clock))
    }

    #[tokio::test]
    async fn test_session_survives_restart() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let first = holder(store.clone());
        first.credentials().ensure_seed_user().await?;
        first.restore().await;
        assert!(first.current().is_none());

        let user = first.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await?;

        let second = holder(store.clone());
        assert!(second.subscribe().borrow().loading);
        assert_eq!(second.restore().await, Some(user.clone()));
        assert_eq!(second.current(), Some(user));
        assert!(!second.subscribe().borrow().loading);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_session_is_cleared() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        store.set(SESSION_KEY, "{\"id\": ").await?;

        let session = holder(store.clone());
        assert_eq!(session.restore().await, None);
        assert_eq!(store.get(SESSION_KEY).await?, None);
        assert!(!session.subscribe().borrow().loading);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_sign_in_clears_loading() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let session = holder(store.clone());
        session.restore().await;

        let result = session.sign_in("nobody@example.com", "nope").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        let state = session.subscribe().borrow().clone();
        assert!(!state.loading);
        assert!(state.user.is_none());
        assert_eq!(store.get(SESSION_KEY).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_up_signs_in_and_sign_out_clears() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let session = holder(store.clone());
        session.restore().await;

        let user = session.sign_up("dave@example.com", "pw", "Dave").await?;
        assert_eq!(session.require_user()?, user);
        assert!(store.get(SESSION_KEY).await?.is_some());

        session.sign_out().await?;
        assert!(session.current().is_none());
        assert!(matches!(session.require_user(), Err(AuthError::NotSignedIn)));
        assert_eq!(store.get(SESSION_KEY).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_in_waits_for_simulated_latency() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let mut clock = MockClock::new();
        clock
            .expect_time()
            .return_const(chrono::DateTime::<chrono::Utc>::default());
        clock
            .expect_sleep()
            .withf(|duration| *duration == Duration::from_secs(1))
            .times(1)
            .returning(|_| ());

        let session = holder_with_clock(store, Arc::new(clock));
        session.credentials().ensure_seed_user().await?;
        session.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_loading_is_set_during_simulated_latency() -> Result<()> {
        let observer = Arc::new(OnceLock::<watch::Receiver<SessionState>>::new());
        let seen = Arc::new(Mutex::new(vec![]));

        let mut clock = MockClock::new();
        clock
            .expect_time()
            .return_const(chrono::DateTime::<chrono::Utc>::default());
        {
            let observer = observer.clone();
            let seen = seen.clone();
            clock.expect_sleep().times(2).returning(move |_| {
                if let Some(receiver) = observer.get() {
                    seen.lock().unwrap().push(receiver.borrow().clone());
                }
            });
        }

        let session = holder_with_clock(Arc::new(MemoryStore::new()), Arc::new(clock));
        session.credentials().ensure_seed_user().await?;
        session.restore().await;
        assert!(observer.set(session.subscribe()).is_ok());

        let failed = session.sign_in(DEMO_EMAIL, "wrong").await;
        assert!(matches!(failed, Err(AuthError::InvalidCredentials)));
        session.sign_up("fay@example.com", "pw", "Fay").await?;

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|state| state.loading && state.user.is_none()));
        assert!(!session.subscribe().borrow().loading);
        Ok(())
    }
}
