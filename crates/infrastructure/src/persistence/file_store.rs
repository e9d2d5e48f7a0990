//! File-based credential store implementation.
//!
//! The session record is stored as a single JSON file under a fixed,
//! namespaced name so every process of this application reads and writes
//! the same record. Absence of the file is the signed-out state.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use gatehouse_application::{CredentialStore, StoreError};
use gatehouse_domain::StoredSession;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// File name of the persisted session record.
const RECORD_FILE: &str = "auth.credentials.json";

/// Credential store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store persisting under the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(RECORD_FILE),
        }
    }

    /// Creates a store under the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no data directory.
    pub fn in_default_location() -> Result<Self, StoreError> {
        let dir = dirs::data_dir().ok_or_else(|| {
            StoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "no platform data directory",
            ))
        })?;
        Ok(Self::new(dir.join("gatehouse")))
    }

    /// Path of the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<StoredSession, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(StoredSession::empty());
            }
            Err(error) => return Err(StoreError::Io(error)),
        };

        match from_json_bytes(&bytes) {
            Ok(record) => Ok(record),
            Err(error) => {
                // An unreadable record is equivalent to being signed out.
                warn!(%error, path = %self.path.display(), "unreadable session record, treating as empty");
                Ok(StoredSession::empty())
            }
        }
    }

    async fn store(&self, record: &StoredSession) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = to_json_stable_bytes(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(StoreError::Io(error)),
        }
    }
}
