//! In-memory session register with write-through persistence.
//!
//! The store is the single place session state lives at runtime. Reads are
//! synchronous against the in-memory register; every mutation writes
//! through to the durable [`CredentialStore`] before the register is
//! updated, so a read immediately after a returned write always observes
//! the new state and the persisted record never runs ahead of memory.

use std::sync::{Arc, RwLock};

use tracing::warn;

use gatehouse_domain::{Credentials, StoredSession, User};

use crate::error::SessionResult;
use crate::ports::CredentialStore;
use crate::session::{read, write};

/// Runtime session state, rehydrated once at startup.
pub struct SessionStore {
    persistence: Arc<dyn CredentialStore>,
    current: RwLock<Option<(Credentials, User)>>,
}

impl SessionStore {
    /// Creates an empty store on top of a persistence port.
    #[must_use]
    pub fn new(persistence: Arc<dyn CredentialStore>) -> Self {
        Self {
            persistence,
            current: RwLock::new(None),
        }
    }

    /// Loads the persisted record into the register.
    ///
    /// A record violating the token-pair invariant is treated as corrupt:
    /// it is cleared rather than partially adopted.
    pub async fn rehydrate(&self) -> SessionResult<()> {
        let record = self.persistence.load().await?;
        match record.into_session() {
            Ok(session) => {
                *write(&self.current) = session;
            }
            Err(error) => {
                warn!(%error, "discarding corrupt session record");
                self.persistence.clear().await?;
                *write(&self.current) = None;
            }
        }
        Ok(())
    }

    /// Current credentials, if signed in.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        read(&self.current).as_ref().map(|(c, _)| c.clone())
    }

    /// Current user, if signed in.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        read(&self.current).as_ref().map(|(_, u)| u.clone())
    }

    /// Returns true if a session is held.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        read(&self.current).is_some()
    }

    /// Replaces the session wholesale. Credentials and user are never
    /// merged with previous state.
    pub async fn replace(&self, credentials: Credentials, user: User) -> SessionResult<()> {
        let record = StoredSession::from_session(&credentials, &user);
        self.persistence.store(&record).await?;
        *write(&self.current) = Some((credentials, user));
        Ok(())
    }

    /// Clears the session wholesale.
    pub async fn clear(&self) -> SessionResult<()> {
        self.persistence.clear().await?;
        *write(&self.current) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fakes::{MemoryCredentialStore, payload};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_replace_is_visible_immediately_and_persisted() {
        let persistence = Arc::new(MemoryCredentialStore::new());
        let store = SessionStore::new(persistence.clone());

        let (credentials, user) = payload("a", 3600).into_session(Utc::now());
        store.replace(credentials.clone(), user.clone()).await.unwrap();

        assert_eq!(store.credentials(), Some(credentials.clone()));
        assert_eq!(store.user(), Some(user.clone()));
        assert_eq!(
            persistence.record(),
            StoredSession::from_session(&credentials, &user)
        );
    }

    #[tokio::test]
    async fn test_clear_empties_register_and_record() {
        let persistence = Arc::new(MemoryCredentialStore::new());
        let store = SessionStore::new(persistence.clone());

        let (credentials, user) = payload("a", 3600).into_session(Utc::now());
        store.replace(credentials, user).await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.is_signed_in());
        assert!(persistence.record().is_empty());
    }

    #[tokio::test]
    async fn test_rehydrate_restores_session_without_expiry() {
        let persistence = Arc::new(MemoryCredentialStore::new());
        {
            let bootstrap = SessionStore::new(persistence.clone());
            let (credentials, user) = payload("a", 3600).into_session(Utc::now());
            bootstrap.replace(credentials, user).await.unwrap();
        }

        let store = SessionStore::new(persistence);
        assert!(!store.is_signed_in());
        store.rehydrate().await.unwrap();

        let credentials = store.credentials().unwrap();
        assert_eq!(credentials.access_token, "access-a");
        // Expiry is not persisted; a rehydrated session renews reactively.
        assert_eq!(credentials.expires_at, None);
    }

    #[tokio::test]
    async fn test_rehydrate_discards_partial_record() {
        let persistence = Arc::new(MemoryCredentialStore::new());
        let partial = StoredSession {
            access_token: Some("orphan".to_string()),
            ..StoredSession::empty()
        };
        persistence.store(&partial).await.unwrap();

        let store = SessionStore::new(persistence.clone());
        store.rehydrate().await.unwrap();

        assert!(!store.is_signed_in());
        assert!(persistence.record().is_empty());
    }
}
