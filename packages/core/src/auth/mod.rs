//! Authentication
//!
//! The access layer never talks to an identity backend directly. It consumes
//! an `AuthProvider` (a watch channel of session state) and resolves the
//! current user through `SessionService`.

mod error;
mod provider;
mod session;

pub use error::AuthError;
pub use provider::{AuthProvider, AuthState, ManualAuthProvider, ProviderUser};
pub use session::{SessionService, SessionUser};
