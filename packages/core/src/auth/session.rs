//! Current-Session Resolution
//!
//! `SessionService` turns the provider's state channel into two
//! capabilities:
//!
//! - `current_user` - one-shot: wait (bounded) for the first settled state
//!   and resolve it to a `SessionUser` or `AuthError::Unauthenticated`
//! - `session_changes` - subscription: a stream of every settled state
//!
//! # Examples
//!
//! ```rust
//! use studyhub_core::auth::{AuthError, ManualAuthProvider, SessionService};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let provider = Arc::new(ManualAuthProvider::signed_out());
//! let sessions = SessionService::new(provider, Duration::from_secs(1));
//!
//! assert_eq!(sessions.current_user().await, Err(AuthError::Unauthenticated));
//! # });
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

use super::error::AuthError;
use super::provider::{AuthProvider, AuthState, ProviderUser};

/// Normalized identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,

    /// Provider display name, falling back to the email address
    pub display_name: Option<String>,
}

impl From<&ProviderUser> for SessionUser {
    fn from(user: &ProviderUser) -> Self {
        let display_name = user
            .display_name
            .as_ref()
            .filter(|name| !name.trim().is_empty())
            .or(user.email.as_ref())
            .cloned();

        Self {
            id: user.uid.clone(),
            email: user.email.clone(),
            display_name,
        }
    }
}

/// Resolves the current session from an auth provider
#[derive(Clone)]
pub struct SessionService {
    provider: Arc<dyn AuthProvider>,
    timeout: Duration,
}

impl SessionService {
    pub fn new(provider: Arc<dyn AuthProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve the signed-in user, once
    ///
    /// Waits for the provider to leave `AuthState::Pending`, bounded by the
    /// configured timeout.
    ///
    /// # Errors
    ///
    /// - `AuthError::Unauthenticated` if the provider reports no session
    /// - `AuthError::Timeout` if the provider stays pending too long
    /// - `AuthError::ProviderClosed` if the provider goes away while pending
    pub async fn current_user(&self) -> Result<SessionUser, AuthError> {
        let mut rx = self.provider.watch_state();

        let state = match tokio::time::timeout(self.timeout, rx.wait_for(|s| !s.is_pending())).await
        {
            Ok(Ok(state)) => state.clone(),
            Ok(Err(_)) => return Err(AuthError::ProviderClosed),
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Auth provider did not report a session state");
                return Err(AuthError::Timeout {
                    waited: self.timeout,
                });
            }
        };

        match state {
            AuthState::SignedIn(user) => Ok(SessionUser::from(&user)),
            AuthState::SignedOut | AuthState::Pending => Err(AuthError::Unauthenticated),
        }
    }

    /// Stream of settled session states
    ///
    /// Yields the current state first (once settled), then every change;
    /// `None` means signed out. The stream ends when the provider goes away.
    pub fn session_changes(&self) -> impl Stream<Item = Option<SessionUser>> + Send + 'static {
        WatchStream::new(self.provider.watch_state()).filter_map(|state| match state {
            AuthState::Pending => None,
            AuthState::SignedOut => Some(None),
            AuthState::SignedIn(user) => Some(Some(SessionUser::from(&user))),
        })
    }
}
