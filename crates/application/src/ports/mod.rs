//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session core and external
//! systems. Each port is a trait that can be implemented by adapters in
//! the infrastructure layer, or by in-memory fakes in tests.

mod clock;
mod credential_store;
mod http_client;
mod token_exchange;

pub use clock::Clock;
pub use credential_store::{CredentialStore, StoreError};
pub use http_client::{HttpClient, HttpClientError, HttpMethod, HttpRequest, HttpResponse};
pub use token_exchange::{ExchangeError, TokenExchange};
