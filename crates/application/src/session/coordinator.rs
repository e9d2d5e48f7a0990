//! Refresh coordinator: the session state machine and single-flight core.
//!
//! The coordinator is the sole writer of session state. It owns:
//! - the explicit state machine for sign-in, sign-out, and refresh
//! - the single in-flight refresh slot shared by every caller
//! - the proactive renewal timer armed ahead of token expiry
//! - the generation counter that lets stale completions be discarded
//! - the per-operation sign-in and sign-up error slots
//!
//! ## State diagram
//!
//! ```text
//! Unauthenticated --sign-in/up--> Authenticating --success--> Authenticated
//!        ^                              |                        |    ^
//!        |                          AuthError           timer or 403  |
//!        |                              |                        v    |
//!        +------------------------------+                   Refreshing
//!        |                                                       |
//!        +------------------- AuthError (session cleared) -------+
//!
//! any state --sign-out--> SignedOut (terminal until the next sign-in)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use gatehouse_domain::{AuthError, Credentials, UserCredentials};

use crate::error::{SessionError, SessionResult};
use crate::ports::{Clock, ExchangeError, TokenExchange};
use crate::session::{SessionStore, lock};

/// Seconds before expiry at which the proactive timer fires.
const REFRESH_LEEWAY_SECS: i64 = 60;

/// Floor on the timer delay, guarding against degenerate near-zero
/// `expires_in` values causing refresh storms.
const MIN_REFRESH_DELAY_SECS: i64 = 60;

/// Delay before proactively renewing credentials issued with the given
/// lifetime: one minute before expiry, but never sooner than one minute
/// from now.
#[must_use]
pub(crate) fn refresh_delay(expires_in: i64) -> Duration {
    let secs = (expires_in - REFRESH_LEEWAY_SECS).max(MIN_REFRESH_DELAY_SECS);
    Duration::from_secs(secs.unsigned_abs())
}

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session held.
    Unauthenticated,
    /// A sign-in or sign-up exchange is in flight.
    Authenticating,
    /// A session is held.
    Authenticated,
    /// A refresh is in flight.
    Refreshing,
    /// The user explicitly ended the session; terminal until the next
    /// sign-in.
    SignedOut,
}

impl SessionState {
    /// Returns true while a sign-in or sign-up exchange is in flight.
    #[must_use]
    pub const fn is_authenticating(self) -> bool {
        matches!(self, Self::Authenticating)
    }

    /// Returns true while a refresh is in flight.
    #[must_use]
    pub const fn is_refreshing(self) -> bool {
        matches!(self, Self::Refreshing)
    }
}

/// Outcome fanned out to every caller awaiting a shared refresh.
type RefreshOutcome = Result<Credentials, SessionError>;

/// The concurrency core of the session manager.
///
/// The coordinator and the [`SessionStore`] it wraps are the only mutable
/// shared state in the system; every other component only reads.
pub struct RefreshCoordinator {
    store: Arc<SessionStore>,
    exchange: Arc<dyn TokenExchange>,
    clock: Arc<dyn Clock>,
    state: Mutex<SessionState>,
    /// At most one outstanding refresh; holds the sender every concurrent
    /// caller subscribes to. Cleared only after the refresh settles.
    inflight: Mutex<Option<broadcast::Sender<RefreshOutcome>>>,
    /// Generation counter bumped on sign-out and at the start of every
    /// sign-in/up, so completions of superseded operations are discarded.
    epoch: AtomicU64,
    timer: Mutex<Option<AbortHandle>>,
    sign_in_error: Mutex<Option<AuthError>>,
    sign_up_error: Mutex<Option<AuthError>>,
}

impl RefreshCoordinator {
    /// Creates a coordinator over an already-rehydrated store.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        exchange: Arc<dyn TokenExchange>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let initial = if store.is_signed_in() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        };
        Self {
            store,
            exchange,
            clock,
            state: Mutex::new(initial),
            inflight: Mutex::new(None),
            epoch: AtomicU64::new(0),
            timer: Mutex::new(None),
            sign_in_error: Mutex::new(None),
            sign_up_error: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// Last sign-in failure, until dismissed.
    #[must_use]
    pub fn sign_in_error(&self) -> Option<AuthError> {
        lock(&self.sign_in_error).clone()
    }

    /// Last sign-up failure, until dismissed.
    #[must_use]
    pub fn sign_up_error(&self) -> Option<AuthError> {
        lock(&self.sign_up_error).clone()
    }

    /// Dismisses the recorded sign-in failure.
    pub fn dismiss_sign_in_error(&self) {
        lock(&self.sign_in_error).take();
    }

    /// Dismisses the recorded sign-up failure.
    pub fn dismiss_sign_up_error(&self) {
        lock(&self.sign_up_error).take();
    }

    /// Returns true while a shared refresh is outstanding.
    #[must_use]
    pub fn refresh_in_flight(&self) -> bool {
        lock(&self.inflight).is_some()
    }

    /// Exchanges a federated credential for a session (sign-in intent).
    ///
    /// On a typed rejection the error lands in the sign-in slot.
    pub async fn sign_in(
        self: &Arc<Self>,
        provider: &str,
        credential: &str,
    ) -> SessionResult<()> {
        self.authenticate(provider, credential, false).await
    }

    /// Exchanges a federated credential for a session (sign-up intent).
    ///
    /// On a typed rejection the error lands in the sign-up slot.
    pub async fn sign_up(
        self: &Arc<Self>,
        provider: &str,
        credential: &str,
    ) -> SessionResult<()> {
        self.authenticate(provider, credential, true).await
    }

    async fn authenticate(
        self: &Arc<Self>,
        provider: &str,
        credential: &str,
        is_new_user: bool,
    ) -> SessionResult<()> {
        match self.state() {
            SessionState::Authenticating => {
                return Err(SessionError::InvalidState(
                    "a sign-in or sign-up exchange is already in flight".to_string(),
                ));
            }
            SessionState::Refreshing => {
                return Err(SessionError::InvalidState(
                    "cannot sign in while a refresh is in flight".to_string(),
                ));
            }
            SessionState::Unauthenticated
            | SessionState::Authenticated
            | SessionState::SignedOut => {}
        }

        // A new sign-in/up must never merge with a stale session.
        self.cancel_refresh_timer();
        self.store.clear().await?;
        if is_new_user {
            lock(&self.sign_up_error).take();
        } else {
            lock(&self.sign_in_error).take();
        }

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_state(SessionState::Authenticating);
        debug!(provider, is_new_user, "exchanging federated credential");

        let result = self
            .exchange
            .credentials_from_federated_credential(provider, credential, is_new_user)
            .await;

        if self.epoch() != epoch {
            debug!("discarding stale authentication completion");
            return Err(SessionError::Superseded);
        }

        match result {
            Ok(payload) => {
                let user_id = payload.user.id.clone();
                self.install_issuance(payload).await?;
                info!(%user_id, is_new_user, "signed in");
                Ok(())
            }
            Err(ExchangeError::Auth(error)) => {
                warn!(%error, is_new_user, "federated credential rejected");
                if is_new_user {
                    *lock(&self.sign_up_error) = Some(error.clone());
                } else {
                    *lock(&self.sign_in_error) = Some(error.clone());
                }
                self.set_state(SessionState::Unauthenticated);
                Err(SessionError::Auth(error))
            }
            Err(ExchangeError::Transport(message)) => {
                warn!(%message, "federated credential exchange failed");
                self.set_state(SessionState::Unauthenticated);
                Err(SessionError::Transport(message))
            }
        }
    }

    /// Ends the session: clears credentials, cancels the renewal timer,
    /// and invalidates any in-flight completion. Idempotent; never makes
    /// a network call.
    pub async fn sign_out(&self) -> SessionResult<()> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cancel_refresh_timer();
        self.store.clear().await?;
        self.set_state(SessionState::SignedOut);
        info!("signed out");
        Ok(())
    }

    /// Explicitly refreshes credentials.
    ///
    /// Calling this without a refresh token, during a sign-in/up exchange,
    /// or while a refresh is already in flight is a programming error and
    /// fails fast; the proactive timer and the 403 handler check state or
    /// join the shared refresh instead of calling blindly.
    pub async fn refresh(self: &Arc<Self>) -> SessionResult<Credentials> {
        if self.refresh_in_flight() {
            return Err(SessionError::InvalidState(
                "a refresh is already in flight".to_string(),
            ));
        }
        match self.state() {
            SessionState::Authenticated => {}
            SessionState::Authenticating => {
                return Err(SessionError::InvalidState(
                    "cannot refresh during a sign-in or sign-up exchange".to_string(),
                ));
            }
            SessionState::Refreshing => {
                return Err(SessionError::InvalidState(
                    "a refresh is already in flight".to_string(),
                ));
            }
            SessionState::Unauthenticated | SessionState::SignedOut => {
                return Err(SessionError::InvalidState(
                    "no refresh token held".to_string(),
                ));
            }
        }
        self.join_or_start_refresh().await
    }

    /// Awaits the in-flight refresh if one exists, otherwise starts one.
    ///
    /// This is the single-flight primitive: arbitrarily many concurrent
    /// callers converge on one backend call and all observe its outcome.
    /// Callers arriving after settlement start a new refresh against the
    /// then-current credentials.
    pub(crate) async fn join_or_start_refresh(self: &Arc<Self>) -> SessionResult<Credentials> {
        enum Role {
            Leader(broadcast::Sender<RefreshOutcome>),
            Follower(broadcast::Receiver<RefreshOutcome>),
        }

        // Subscribing and occupying the slot happen under the same lock,
        // so a follower can never miss the settlement broadcast.
        let role = {
            let mut slot = lock(&self.inflight);
            if let Some(sender) = slot.as_ref() {
                Role::Follower(sender.subscribe())
            } else {
                let (sender, _) = broadcast::channel(1);
                *slot = Some(sender.clone());
                Role::Leader(sender)
            }
        };

        match role {
            Role::Follower(mut receiver) => {
                debug!("joining in-flight refresh");
                match receiver.recv().await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(SessionError::Transport(
                        "in-flight refresh was abandoned".to_string(),
                    )),
                }
            }
            Role::Leader(sender) => {
                let Some(credentials) = self.store.credentials() else {
                    lock(&self.inflight).take();
                    return Err(SessionError::NotSignedIn);
                };
                self.set_state(SessionState::Refreshing);
                let epoch = self.epoch();
                let outcome = self.run_refresh(&credentials.refresh_token, epoch).await;
                // Clear the slot before broadcasting: late arrivals must
                // see the settled store, not a stale in-flight handle.
                lock(&self.inflight).take();
                let _ = sender.send(outcome.clone());
                outcome
            }
        }
    }

    /// Performs the refresh exchange and applies its outcome.
    async fn run_refresh(
        self: &Arc<Self>,
        refresh_token: &str,
        epoch: u64,
    ) -> SessionResult<Credentials> {
        debug!("refreshing credentials");
        let result = self.exchange.refresh_credentials(refresh_token).await;

        if self.epoch() != epoch {
            debug!("discarding stale refresh completion");
            return Err(SessionError::Superseded);
        }

        match result {
            Ok(payload) => {
                let credentials = self.install_issuance(payload).await?;
                info!("credentials refreshed");
                Ok(credentials)
            }
            Err(ExchangeError::Auth(error)) => {
                // Unrecoverable: tear the session down silently. From the
                // user's perspective an expired session and never having
                // signed in are the same state.
                warn!(%error, "refresh rejected, ending session");
                self.cancel_refresh_timer();
                self.store.clear().await?;
                self.set_state(SessionState::Unauthenticated);
                Err(SessionError::Auth(error))
            }
            Err(ExchangeError::Transport(message)) => {
                warn!(%message, "refresh transport failure, keeping session");
                self.set_state(SessionState::Authenticated);
                Err(SessionError::Transport(message))
            }
        }
    }

    /// Adopts a successful token issuance: replaces the session wholesale,
    /// clears stale auth errors, and rearms the renewal timer.
    async fn install_issuance(
        self: &Arc<Self>,
        payload: UserCredentials,
    ) -> SessionResult<Credentials> {
        let expires_in = payload.expires_in;
        let (credentials, user) = payload.into_session(self.clock.now());
        self.store.replace(credentials.clone(), user).await?;
        lock(&self.sign_in_error).take();
        lock(&self.sign_up_error).take();
        self.set_state(SessionState::Authenticated);
        self.arm_refresh_timer(expires_in);
        Ok(credentials)
    }

    /// Arms the proactive renewal timer, replacing any previous one.
    fn arm_refresh_timer(self: &Arc<Self>, expires_in: i64) {
        let delay = refresh_delay(expires_in);
        let epoch = self.epoch();
        let coordinator = Arc::downgrade(self);
        debug!(delay_secs = delay.as_secs(), "arming refresh timer");

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(coordinator) = coordinator.upgrade() else {
                return;
            };
            if coordinator.epoch() != epoch {
                debug!("refresh timer fired for an ended session");
                return;
            }
            if coordinator.state() != SessionState::Authenticated
                || coordinator.refresh_in_flight()
            {
                debug!("refresh timer fired while a refresh was underway");
                return;
            }
            if let Err(error) = coordinator.refresh().await {
                debug!(%error, "proactive refresh did not complete");
            }
        });

        if let Some(previous) = lock(&self.timer).replace(handle.abort_handle()) {
            previous.abort();
        }
    }

    /// Cancels the proactive renewal timer.
    fn cancel_refresh_timer(&self) {
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
        }
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn set_state(&self, next: SessionState) {
        let mut state = lock(&self.state);
        if *state != next {
            debug!(from = ?*state, to = ?next, "session state transition");
            *state = next;
        }
    }
}
