//! Session facade.
//!
//! The single surface UI and data-fetching code talk to. It wires the
//! store, coordinator, and request wrapper together, resolves which
//! federated identity provider this installation should use, and exposes
//! the loading flags and dismissible error slots views bind to.

use std::sync::Arc;

use tracing::warn;

use gatehouse_domain::{AuthError, Credentials, User, resolve_active_provider};

use crate::error::{SessionError, SessionResult};
use crate::ports::{
    Clock, CredentialStore, HttpClient, HttpRequest, HttpResponse, TokenExchange,
};
use crate::session::{AuthenticatedClient, RefreshCoordinator, SessionStore};

/// Issuer for Google-federated sign-in.
pub const GOOGLE_ISSUER: &str = "https://accounts.google.com";

/// Client-side session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// OAuth client id this installation authenticates as.
    pub client_id: String,
    /// Issuer whose providers are eligible for federated sign-in.
    pub issuer: String,
}

impl SessionConfig {
    /// Configuration for the given client id against the Google issuer.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            issuer: GOOGLE_ISSUER.to_string(),
        }
    }
}

/// Descriptor for the federated sign-in flow the UI should offer.
///
/// Present only when the backend advertises a provider matching this
/// installation's client id and issuer; without it the sign-in affordance
/// is hidden entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedSignIn {
    /// Client id to initialize the identity SDK with.
    pub client_id: String,
    /// Backend name of the matched provider, passed back on exchange.
    pub provider: String,
}

/// The authentication session, as seen by the rest of the application.
pub struct Session {
    store: Arc<SessionStore>,
    coordinator: Arc<RefreshCoordinator>,
    client: AuthenticatedClient,
    federated: Option<FederatedSignIn>,
}

impl Session {
    /// Builds a session: rehydrates any persisted credentials and resolves
    /// the active federated identity provider.
    ///
    /// A transport failure while fetching the provider directory is not
    /// fatal; the session comes up without a sign-in affordance and an
    /// already-persisted session still works.
    pub async fn connect(
        config: SessionConfig,
        persistence: Arc<dyn CredentialStore>,
        exchange: Arc<dyn TokenExchange>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> SessionResult<Self> {
        let store = Arc::new(SessionStore::new(persistence));
        store.rehydrate().await?;

        let federated = match exchange.federated_identity_providers().await {
            Ok(providers) => {
                resolve_active_provider(&providers, &config.client_id, &config.issuer).map(
                    |provider| FederatedSignIn {
                        client_id: config.client_id.clone(),
                        provider: provider.to_string(),
                    },
                )
            }
            Err(error) => {
                warn!(%error, "could not fetch federated identity providers");
                None
            }
        };

        let coordinator = Arc::new(RefreshCoordinator::new(store.clone(), exchange, clock));
        let client = AuthenticatedClient::new(http, coordinator.clone(), store.clone());

        Ok(Self {
            store,
            coordinator,
            client,
            federated,
        })
    }

    /// Currently signed-in user.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.store.user()
    }

    /// Current credentials.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.store.credentials()
    }

    /// Returns true if a session is held.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.store.is_signed_in()
    }

    /// Returns true while a sign-in or sign-up exchange is in flight.
    #[must_use]
    pub fn is_authenticating(&self) -> bool {
        self.coordinator.state().is_authenticating()
    }

    /// Returns true while a refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.coordinator.state().is_refreshing() || self.coordinator.refresh_in_flight()
    }

    /// The federated sign-in flow to offer, if any provider matched.
    #[must_use]
    pub fn federated_sign_in(&self) -> Option<&FederatedSignIn> {
        self.federated.as_ref()
    }

    /// Last sign-in failure, until dismissed or superseded.
    #[must_use]
    pub fn sign_in_error(&self) -> Option<AuthError> {
        self.coordinator.sign_in_error()
    }

    /// Last sign-up failure, until dismissed or superseded.
    #[must_use]
    pub fn sign_up_error(&self) -> Option<AuthError> {
        self.coordinator.sign_up_error()
    }

    /// Dismisses the sign-in error without touching the sign-up slot.
    pub fn dismiss_sign_in_error(&self) {
        self.coordinator.dismiss_sign_in_error();
    }

    /// Dismisses the sign-up error without touching the sign-in slot.
    pub fn dismiss_sign_up_error(&self) {
        self.coordinator.dismiss_sign_up_error();
    }

    /// Signs in with a federated credential obtained from the identity
    /// provider named by [`Self::federated_sign_in`].
    pub async fn sign_in_with_federated_credential(
        &self,
        credential: &str,
    ) -> SessionResult<()> {
        let provider = self.active_provider()?;
        self.coordinator.sign_in(&provider, credential).await
    }

    /// Signs up with a federated credential.
    pub async fn sign_up_with_federated_credential(
        &self,
        credential: &str,
    ) -> SessionResult<()> {
        let provider = self.active_provider()?;
        self.coordinator.sign_up(&provider, credential).await
    }

    /// Ends the session. Idempotent; never makes a network call.
    pub async fn sign_out(&self) -> SessionResult<()> {
        self.coordinator.sign_out().await
    }

    /// Explicitly renews credentials.
    pub async fn refresh_credentials(&self) -> SessionResult<()> {
        self.coordinator.refresh().await.map(|_| ())
    }

    /// Issues a request with the current bearer token, renewing it behind
    /// the scenes if the backend rejects it.
    pub async fn authenticated_fetch(&self, request: HttpRequest) -> SessionResult<HttpResponse> {
        self.client.send(request).await
    }

    fn active_provider(&self) -> SessionResult<String> {
        self.federated
            .as_ref()
            .map(|f| f.provider.clone())
            .ok_or_else(|| {
                SessionError::InvalidState(
                    "no federated identity provider matches this client".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ExchangeError;
    use crate::session::fakes::{
        FakeExchange, FakeHttp, FixedClock, MemoryCredentialStore, ok_response, payload,
    };
    use chrono::Utc;
    use gatehouse_domain::{AuthErrorKind, FederatedProvider};
    use pretty_assertions::assert_eq;

    fn provider(name: &str, audience: &str, issuer: &str) -> FederatedProvider {
        FederatedProvider {
            name: name.to_string(),
            audience: audience.to_string(),
            issuer: issuer.to_string(),
        }
    }

    async fn connect(exchange: FakeExchange, client_id: &str) -> Session {
        let persistence = Arc::new(MemoryCredentialStore::new());
        connect_with(exchange, client_id, persistence).await
    }

    async fn connect_with(
        exchange: FakeExchange,
        client_id: &str,
        persistence: Arc<MemoryCredentialStore>,
    ) -> Session {
        Session::connect(
            SessionConfig::new(client_id),
            persistence,
            Arc::new(exchange),
            Arc::new(FakeHttp::new(|_| Ok(ok_response()))),
            Arc::new(FixedClock::new(Utc::now())),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolves_matching_provider_last_match_wins() {
        let mut exchange = FakeExchange::new();
        exchange.providers = vec![
            provider("g1", "OTHER", GOOGLE_ISSUER),
            provider("g2", "CID", GOOGLE_ISSUER),
            provider("g3", "CID", "https://example.com"),
            provider("g4", "CID", GOOGLE_ISSUER),
        ];

        let session = connect(exchange, "CID").await;

        assert_eq!(
            session.federated_sign_in(),
            Some(&FederatedSignIn {
                client_id: "CID".to_string(),
                provider: "g4".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_sign_in_gated_on_provider_match() {
        let mut exchange = FakeExchange::new();
        exchange.providers = vec![provider("g1", "OTHER", GOOGLE_ISSUER)];

        let session = connect(exchange, "CID").await;

        assert_eq!(session.federated_sign_in(), None);
        let result = session.sign_in_with_federated_credential("fed-cred").await;
        assert!(matches!(result, Err(SessionError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_provider_directory_outage_is_not_fatal() {
        struct DownExchange;

        #[async_trait::async_trait]
        impl crate::ports::TokenExchange for DownExchange {
            async fn federated_identity_providers(
                &self,
            ) -> Result<Vec<FederatedProvider>, ExchangeError> {
                Err(ExchangeError::Transport("dns failure".to_string()))
            }

            async fn credentials_from_federated_credential(
                &self,
                _provider: &str,
                _credential: &str,
                _is_new_user: bool,
            ) -> Result<gatehouse_domain::UserCredentials, ExchangeError> {
                Err(ExchangeError::Transport("dns failure".to_string()))
            }

            async fn refresh_credentials(
                &self,
                _refresh_token: &str,
            ) -> Result<gatehouse_domain::UserCredentials, ExchangeError> {
                Err(ExchangeError::Transport("dns failure".to_string()))
            }
        }

        let session = Session::connect(
            SessionConfig::new("CID"),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(DownExchange),
            Arc::new(FakeHttp::new(|_| Ok(ok_response()))),
            Arc::new(FixedClock::new(Utc::now())),
        )
        .await
        .unwrap();

        assert_eq!(session.federated_sign_in(), None);
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_connect_rehydrates_persisted_session() {
        let persistence = Arc::new(MemoryCredentialStore::new());
        {
            let mut exchange = FakeExchange::new();
            exchange.providers = vec![provider("g1", "CID", GOOGLE_ISSUER)];
            exchange.push_exchange(Ok(payload("a", 3600)));
            let session = connect_with(exchange, "CID", persistence.clone()).await;
            session.sign_in_with_federated_credential("fed-cred").await.unwrap();
        }

        let session = connect_with(FakeExchange::new(), "CID", persistence).await;

        assert!(session.is_signed_in());
        assert_eq!(session.current_user().unwrap().display_name, "Ada");
        // Lifetime is not persisted; the session renews on first rejection.
        assert_eq!(session.credentials().unwrap().expires_at, None);
    }

    #[tokio::test]
    async fn test_sign_in_error_survives_until_successful_sign_up() {
        let mut exchange = FakeExchange::new();
        exchange.providers = vec![provider("g1", "CID", GOOGLE_ISSUER)];
        exchange.push_exchange(Err(ExchangeError::Auth(gatehouse_domain::AuthError {
            kind: AuthErrorKind::UserNotSignedUp,
            detail: "unknown user".to_string(),
        })));
        exchange.push_exchange(Ok(payload("a", 3600)));

        let session = connect(exchange, "CID").await;

        let result = session.sign_in_with_federated_credential("fed-cred").await;
        assert!(result.is_err());
        assert_eq!(
            session.sign_in_error().map(|e| e.kind),
            Some(AuthErrorKind::UserNotSignedUp)
        );

        session
            .sign_up_with_federated_credential("fed-cred")
            .await
            .unwrap();
        assert!(session.is_signed_in());
        assert!(session.sign_in_error().is_none());
        assert!(session.sign_up_error().is_none());
    }

    #[tokio::test]
    async fn test_dismissing_one_error_slot_leaves_the_other() {
        let mut exchange = FakeExchange::new();
        exchange.providers = vec![provider("g1", "CID", GOOGLE_ISSUER)];
        exchange.push_exchange(Err(ExchangeError::Auth(gatehouse_domain::AuthError {
            kind: AuthErrorKind::UserNotSignedUp,
            detail: "unknown user".to_string(),
        })));
        exchange.push_exchange(Err(ExchangeError::Auth(gatehouse_domain::AuthError {
            kind: AuthErrorKind::UserAlreadySignedUp,
            detail: "duplicate".to_string(),
        })));

        let session = connect(exchange, "CID").await;
        let _ = session.sign_in_with_federated_credential("fed-cred").await;
        let _ = session.sign_up_with_federated_credential("fed-cred").await;
        assert!(session.sign_in_error().is_some());
        assert!(session.sign_up_error().is_some());

        session.dismiss_sign_up_error();
        assert!(session.sign_in_error().is_some());
        assert!(session.sign_up_error().is_none());

        session.dismiss_sign_in_error();
        assert!(session.sign_in_error().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_round_trip_leaves_store_empty() {
        let mut exchange = FakeExchange::new();
        exchange.providers = vec![provider("g1", "CID", GOOGLE_ISSUER)];
        exchange.push_exchange(Ok(payload("a", 3600)));
        let persistence = Arc::new(MemoryCredentialStore::new());
        let session = connect_with(exchange, "CID", persistence.clone()).await;

        session.sign_in_with_federated_credential("fed-cred").await.unwrap();
        session.sign_out().await.unwrap();

        assert!(!session.is_signed_in());
        assert!(session.current_user().is_none());
        assert!(persistence.record().is_empty());
    }
}
