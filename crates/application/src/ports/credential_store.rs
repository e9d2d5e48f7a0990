//! Credential store port
//!
//! Defines the interface for durable session persistence. The store is a
//! dumb key/value register under a fixed namespace: no validation, no
//! expiry checks, just the record. It must survive process restart so a
//! previously signed-in user is not forced through sign-in every launch.

use async_trait::async_trait;

use gatehouse_domain::StoredSession;

/// Errors that can occur during credential store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting the session record.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Loads the persisted record.
    ///
    /// Returns the empty record if nothing has been stored yet.
    async fn load(&self) -> Result<StoredSession, StoreError>;

    /// Replaces the persisted record wholesale.
    async fn store(&self, record: &StoredSession) -> Result<(), StoreError>;

    /// Clears the persisted record.
    async fn clear(&self) -> Result<(), StoreError>;
}
