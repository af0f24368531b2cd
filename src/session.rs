//! Session store: the current credential and the identity it belongs to.
//!
//! The store is created once by the shell and handed to every page as an
//! `Arc<SessionStore>`; only its own `login`/`logout`/`validate` mutate it.
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument, warn};

use crate::api::{ApiError, BlogApi};
use crate::db::{self, Pool};
use crate::model::Identity;

/// Durable storage for the single credential string.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>>;
    async fn save(&self, credential: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Credential persisted in SQLite, scoped to one API origin.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: Pool,
    origin: String,
}

impl SqliteCredentialStore {
    pub fn new(pool: Pool, origin: impl Into<String>) -> Self {
        Self {
            pool,
            origin: origin.into(),
        }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn load(&self) -> Result<Option<String>> {
        db::get_credential(&self.pool, &self.origin).await
    }

    async fn save(&self, credential: &str) -> Result<()> {
        db::put_credential(&self.pool, &self.origin, credential).await
    }

    async fn clear(&self) -> Result<()> {
        db::delete_credential(&self.pool, &self.origin).await
    }
}

/// Process-local storage, used when nothing should outlive the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(credential.into())),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    async fn save(&self, credential: &str) -> Result<()> {
        *self.slot() = Some(credential.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// Snapshot of the session. `identity` is only ever set while `credential` is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub credential: Option<String>,
    pub identity: Option<Identity>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Holding a credential the API has not vouched for yet.
    pub fn identity_pending(&self) -> bool {
        self.credential.is_some() && self.identity.is_none()
    }
}

pub struct SessionStore {
    state: Mutex<Session>,
    storage: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.snapshot();
        f.debug_struct("SessionStore")
            .field("authenticated", &session.is_authenticated())
            .field("identity", &session.identity)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Empty session over `storage`; call [`SessionStore::restore`] to pick up a
    /// credential saved by an earlier run.
    pub fn new(storage: Arc<dyn CredentialStore>) -> Self {
        Self {
            state: Mutex::new(Session::default()),
            storage,
        }
    }

    fn state(&self) -> MutexGuard<'_, Session> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Session {
        self.state().clone()
    }

    pub fn credential(&self) -> Option<String> {
        self.state().credential.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state().identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Load a stored credential and treat the user as tentatively signed in.
    /// Nothing is validated until an API call needs it.
    #[instrument(skip_all)]
    pub async fn restore(&self) -> bool {
        let stored = match self.storage.load().await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(?err, "failed to read stored credential; starting signed out");
                None
            }
        };
        let mut state = self.state();
        *state = Session {
            credential: stored,
            identity: None,
        };
        if state.credential.is_some() {
            info!("restored stored credential");
        }
        state.is_authenticated()
    }

    /// Store a freshly issued credential; identity stays pending until validated.
    #[instrument(skip_all)]
    pub async fn login(&self, credential: String) {
        if let Err(err) = self.storage.save(&credential).await {
            warn!(?err, "failed to persist credential; it will last for this run only");
        }
        *self.state() = Session {
            credential: Some(credential),
            identity: None,
        };
        info!("signed in");
    }

    /// Forget the credential and identity. Never fails.
    #[instrument(skip_all)]
    pub async fn logout(&self) {
        *self.state() = Session::default();
        if let Err(err) = self.storage.clear().await {
            warn!(?err, "failed to clear stored credential");
        }
        info!("signed out");
    }

    /// Confirm the credential by fetching the identity it belongs to.
    ///
    /// Returns `Ok(None)` when there is no credential. A 401 clears the session.
    #[instrument(skip_all)]
    pub async fn validate(&self, api: &dyn BlogApi) -> Result<Option<Identity>, ApiError> {
        let Some(credential) = self.credential() else {
            return Ok(None);
        };
        match api.current_user(Some(&credential)).await {
            Ok(identity) => {
                let mut state = self.state();
                // A logout or re-login while the fetch was in flight wins.
                if state.credential.as_deref() == Some(credential.as_str()) {
                    state.identity = Some(identity.clone());
                }
                Ok(Some(identity))
            }
            Err(err) => {
                if err.is_unauthorized() {
                    warn!("stored credential rejected by the API");
                    self.logout().await;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_persists_and_logout_clears() {
        let storage = Arc::new(MemoryCredentialStore::default());
        let session = SessionStore::new(storage.clone());
        assert!(!session.is_authenticated());

        session.login("tok".into()).await;
        assert!(session.snapshot().identity_pending());
        assert_eq!(storage.load().await.unwrap().as_deref(), Some("tok"));

        session.logout().await;
        assert_eq!(session.snapshot(), Session::default());
        assert_eq!(storage.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn restore_is_tentative() {
        let session = SessionStore::new(Arc::new(MemoryCredentialStore::with_credential("saved")));
        assert!(session.restore().await);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.credential.as_deref(), Some("saved"));
        assert!(snapshot.identity.is_none());
    }

    #[tokio::test]
    async fn restore_without_stored_credential_is_signed_out() {
        let session = SessionStore::new(Arc::new(MemoryCredentialStore::default()));
        assert!(!session.restore().await);
        assert!(!session.is_authenticated());
    }
}
