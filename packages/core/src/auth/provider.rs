//! Auth Provider Abstraction
//!
//! The external authentication provider is consumed through one capability:
//! a watch channel publishing the current session state. A provider starts
//! in `AuthState::Pending` until it has restored (or failed to restore) a
//! session, then moves between `SignedOut` and `SignedIn` as users sign in
//! and out.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// User as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl ProviderUser {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// Session state published by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Provider has not yet reported (initial restore in progress)
    Pending,
    SignedOut,
    SignedIn(ProviderUser),
}

impl AuthState {
    pub fn is_pending(&self) -> bool {
        matches!(self, AuthState::Pending)
    }
}

/// External authentication provider
pub trait AuthProvider: Send + Sync {
    /// Receiver observing the current state and every later change
    fn watch_state(&self) -> watch::Receiver<AuthState>;
}

/// Provider driven by explicit calls
///
/// Stands in for a real provider in tests and the dev tool, and adapts
/// callback-style SDKs: forward their notifications into `sign_in` /
/// `sign_out`.
#[derive(Debug)]
pub struct ManualAuthProvider {
    state: watch::Sender<AuthState>,
}

impl ManualAuthProvider {
    /// Provider that has not reported yet
    pub fn pending() -> Self {
        let (state, _) = watch::channel(AuthState::Pending);
        Self { state }
    }

    /// Provider reporting no session
    pub fn signed_out() -> Self {
        let (state, _) = watch::channel(AuthState::SignedOut);
        Self { state }
    }

    /// Provider reporting `user` as signed in
    pub fn signed_in(user: ProviderUser) -> Self {
        let (state, _) = watch::channel(AuthState::SignedIn(user));
        Self { state }
    }

    pub fn sign_in(&self, user: ProviderUser) {
        tracing::debug!(uid = %user.uid, "Auth state: signed in");
        self.state.send_replace(AuthState::SignedIn(user));
    }

    pub fn sign_out(&self) {
        tracing::debug!("Auth state: signed out");
        self.state.send_replace(AuthState::SignedOut);
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }
}

impl AuthProvider for ManualAuthProvider {
    fn watch_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}
