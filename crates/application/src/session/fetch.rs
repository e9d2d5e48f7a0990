//! Authenticated request wrapper.
//!
//! Attaches the current bearer token to outgoing requests and transparently
//! recovers from auth failures: on a 401/403 while signed in it joins (or
//! starts) the shared refresh, then replays the request exactly once with
//! the renewed token. Anything beyond one retry means the renewed token was
//! itself rejected, which the refresh path handles by ending the session.

use std::sync::Arc;

use tracing::debug;

use crate::error::SessionResult;
use crate::ports::{HttpClient, HttpRequest, HttpResponse};
use crate::session::{RefreshCoordinator, SessionStore};

/// HTTP client decorated with bearer attachment and one-shot retry.
pub struct AuthenticatedClient {
    http: Arc<dyn HttpClient>,
    coordinator: Arc<RefreshCoordinator>,
    store: Arc<SessionStore>,
}

impl AuthenticatedClient {
    /// Creates a wrapper over a raw transport.
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        coordinator: Arc<RefreshCoordinator>,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            http,
            coordinator,
            store,
        }
    }

    /// Issues the request with the current bearer token attached.
    ///
    /// Without a session the request goes out bare and auth failures are
    /// returned as-is. With a session, a 401/403 response triggers a shared
    /// refresh and a single replay; a failed refresh propagates instead of
    /// the response.
    pub async fn send(&self, request: HttpRequest) -> SessionResult<HttpResponse> {
        let mut attempt = request.clone();
        let signed_in = match self.store.credentials() {
            Some(credentials) => {
                attempt.set_header("Authorization", credentials.authorization_header());
                true
            }
            None => false,
        };

        let response = self.http.send(attempt).await?;
        if !signed_in || !response.is_auth_failure() {
            return Ok(response);
        }

        debug!(
            status = response.status,
            url = %request.url,
            "bearer rejected, refreshing and retrying once"
        );
        let renewed = self.coordinator.join_or_start_refresh().await?;

        let mut retry = request;
        retry.set_header("Authorization", renewed.authorization_header());
        Ok(self.http.send(retry).await?)
    }
}
