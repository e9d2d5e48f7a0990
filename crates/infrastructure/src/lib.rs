//! Gatehouse Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod api;
pub mod persistence;
pub mod serialization;

pub use adapters::{ReqwestHttpClient, SystemClock};
pub use api::GraphQlTokenExchange;
pub use persistence::FileCredentialStore;
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
