//! Authentication domain types for the Gatehouse session manager.
//!
//! This module provides:
//! - Session credentials and user identity types
//! - The token issuance payload returned by the backend
//! - Typed authentication errors with user-facing copy
//! - Federated identity provider matching

mod provider;
mod types;

pub use provider::{FederatedProvider, resolve_active_provider};
pub use types::{AuthError, AuthErrorKind, Credentials, User, UserCredentials};
