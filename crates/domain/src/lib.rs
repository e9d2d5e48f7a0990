//! Gatehouse Domain - Core session types
//!
//! This crate defines the domain model for the Gatehouse session manager.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod persistence;

pub use auth::{
    AuthError, AuthErrorKind, Credentials, FederatedProvider, User, UserCredentials,
    resolve_active_provider,
};
pub use error::{DomainError, DomainResult};
pub use persistence::StoredSession;
