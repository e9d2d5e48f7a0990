//! Gatehouse Application - Session management core
//!
//! This crate owns the state-machine and concurrency logic of the session
//! manager: the single-flight refresh coordinator, the proactive renewal
//! timer, the authenticated request wrapper, and the public session facade.
//! All I/O goes through ports implemented by the infrastructure layer.

pub mod error;
pub mod ports;
pub mod session;

pub use error::{SessionError, SessionResult};
pub use ports::{
    Clock, CredentialStore, ExchangeError, HttpClient, HttpClientError, HttpMethod, HttpRequest,
    HttpResponse, StoreError, TokenExchange,
};
pub use session::{
    AuthenticatedClient, FederatedSignIn, GOOGLE_ISSUER, RefreshCoordinator, Session,
    SessionConfig, SessionState, SessionStore,
};
