//! Service Layer Error Types
//!
//! This module defines the error type returned by entity handles, the
//! registry and the settings store. Storage and auth failures are carried
//! unchanged so callers keep the original diagnostic detail.

use crate::auth::AuthError;
use crate::db::DatabaseError;
use thiserror::Error;

/// Entity operation errors
#[derive(Error, Debug)]
pub enum EntityError {
    /// Database operation failed
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    /// Session resolution failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Domain name missing from the entity table
    #[error("Unknown entity: {name}")]
    UnknownEntity { name: String },

    /// Typed payload or result did not map to/from a document
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Payload is not a JSON object
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl EntityError {
    /// Create an unknown entity error
    pub fn unknown_entity(name: impl Into<String>) -> Self {
        Self::UnknownEntity { name: name.into() }
    }

    /// Create an invalid payload error
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// True if a write targeted a missing document
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Database(err) if err.is_not_found())
    }

    /// True if session resolution found no signed-in user
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Auth(AuthError::Unauthenticated))
    }
}

/// Result type for entity operations
pub type EntityResult<T> = Result<T, EntityError>;
