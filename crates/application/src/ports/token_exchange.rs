//! Token exchange port
//!
//! The two backend operations that mint or rotate tokens, plus the
//! provider directory query. All three are made over an unauthenticated
//! client: attaching an existing bearer token here would create a circular
//! dependency on the very credentials being replaced.

use async_trait::async_trait;

use gatehouse_domain::{AuthError, FederatedProvider, UserCredentials};

/// Errors from a token exchange call.
///
/// A well-formed [`AuthError`] response from the backend is distinguished
/// from a transport-level failure where no response arrived; callers must
/// handle both. Cloneable so one refresh outcome can be shared.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    /// The backend answered with a typed authentication error.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// No well-formed response was received.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Port for the backend authentication operations.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Fetch the federated identity providers advertised by the backend.
    ///
    /// Idempotent; safe to poll once per session start.
    async fn federated_identity_providers(&self)
    -> Result<Vec<FederatedProvider>, ExchangeError>;

    /// Exchange a federated credential for application-native tokens.
    ///
    /// `is_new_user` distinguishes sign-up from sign-in intent server-side.
    async fn credentials_from_federated_credential(
        &self,
        provider: &str,
        credential: &str,
        is_new_user: bool,
    ) -> Result<UserCredentials, ExchangeError>;

    /// Rotate tokens using a refresh token.
    async fn refresh_credentials(
        &self,
        refresh_token: &str,
    ) -> Result<UserCredentials, ExchangeError>;
}
