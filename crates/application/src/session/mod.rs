//! Session management core
//!
//! This module wires together:
//! - [`SessionStore`]: the in-memory credential register with write-through
//!   persistence
//! - [`RefreshCoordinator`]: the state machine owning sign-in, sign-out,
//!   and the single-flight refresh discipline
//! - [`AuthenticatedClient`]: the bearer-attaching request wrapper
//! - [`Session`]: the public facade consumed by UI and data-fetching code

mod coordinator;
mod facade;
mod fetch;
mod store;

pub use coordinator::{RefreshCoordinator, SessionState};
pub use facade::{FederatedSignIn, GOOGLE_ISSUER, Session, SessionConfig};
pub use fetch::AuthenticatedClient;
pub use store::SessionStore;

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Locks a mutex, recovering the guard if a writer panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires a read lock, recovering the guard if a writer panicked.
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires a write lock, recovering the guard if a writer panicked.
pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
