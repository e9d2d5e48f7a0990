//! Application error types

use thiserror::Error;

use gatehouse_domain::AuthError;

use crate::ports::{ExchangeError, HttpClientError, StoreError};

/// Errors surfaced by session operations.
///
/// The taxonomy distinguishes three classes: typed backend rejections
/// (`Auth`), transport failures where no response was received
/// (`Transport`/`Http`), and programming-contract violations
/// (`InvalidState`) which are fatal to the call but never user-facing.
/// Cloneable so a single refresh outcome can be fanned out to every
/// caller awaiting it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The backend rejected the operation with a typed authentication error.
    #[error("authentication rejected: {0}")]
    Auth(AuthError),

    /// A token-exchange call produced no well-formed response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The operation requires a signed-in session.
    #[error("not signed in")]
    NotSignedIn,

    /// The operation is not valid in the current session state.
    #[error("invalid session state: {0}")]
    InvalidState(String),

    /// The credential store could not be read or written.
    #[error("storage failure: {0}")]
    Storage(String),

    /// A wrapped HTTP request failed at the transport level.
    #[error("HTTP failure: {0}")]
    Http(String),

    /// The operation completed after a newer sign-in or sign-out made its
    /// result irrelevant; the completion was discarded.
    #[error("operation superseded by a newer sign-in or sign-out")]
    Superseded,
}

impl From<AuthError> for SessionError {
    fn from(error: AuthError) -> Self {
        Self::Auth(error)
    }
}

impl From<ExchangeError> for SessionError {
    fn from(error: ExchangeError) -> Self {
        match error {
            ExchangeError::Auth(error) => Self::Auth(error),
            ExchangeError::Transport(message) => Self::Transport(message),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(error: StoreError) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<HttpClientError> for SessionError {
    fn from(error: HttpClientError) -> Self {
        Self::Http(error.to_string())
    }
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
