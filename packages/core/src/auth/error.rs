//! Auth Error Types

use std::time::Duration;
use thiserror::Error;

/// Session resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The provider reports no active session
    #[error("Not authenticated")]
    Unauthenticated,

    /// The provider did not settle on a state within the configured bound
    #[error("Timed out after {waited:?} waiting for the auth provider")]
    Timeout { waited: Duration },

    /// The provider stopped publishing state before settling
    #[error("Auth provider closed before reporting a session state")]
    ProviderClosed,
}
