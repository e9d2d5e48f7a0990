//! Persisted session record
//!
//! The record mirrors the durable key/value layout consumed by the
//! credential store: a single namespaced object whose fields are either
//! all present (a signed-in session) or all absent (signed out). Token
//! expiry is deliberately not persisted; a rehydrated session relies on
//! reactive refresh for its first renewal.

use serde::{Deserialize, Serialize};

use crate::auth::{Credentials, User};
use crate::error::{DomainError, DomainResult};

/// Durable session record, written on every successful token issuance
/// and emptied on sign-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSession {
    /// Persisted access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Persisted refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Persisted user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Persisted display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_display_name: Option<String>,
    /// Persisted avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_avatar_url: Option<String>,
    /// Persisted email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl StoredSession {
    /// The signed-out record.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if no session is recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user_id.is_none()
    }

    /// Build a record from live session state.
    #[must_use]
    pub fn from_session(credentials: &Credentials, user: &User) -> Self {
        Self {
            access_token: Some(credentials.access_token.clone()),
            refresh_token: Some(credentials.refresh_token.clone()),
            user_id: Some(user.id.clone()),
            user_display_name: Some(user.display_name.clone()),
            user_avatar_url: user.avatar_url.clone(),
            user_email: user.email.clone(),
        }
    }

    /// Rehydrate session state from the record.
    ///
    /// Returns `Ok(None)` for the empty record. A record holding one token
    /// without the other violates the issuance invariant and is rejected.
    pub fn into_session(self) -> DomainResult<Option<(Credentials, User)>> {
        match (self.access_token, self.refresh_token, self.user_id) {
            (None, None, None) => Ok(None),
            (Some(access_token), Some(refresh_token), Some(id)) => {
                let credentials = Credentials {
                    access_token,
                    refresh_token,
                    expires_at: None,
                };
                let user = User {
                    id,
                    display_name: self.user_display_name.unwrap_or_default(),
                    avatar_url: self.user_avatar_url,
                    email: self.user_email,
                };
                Ok(Some((credentials, user)))
            }
            _ => Err(DomainError::PartialSession(
                "record holds a partial token pair".to_string(),
            )),
        }
    }
}
