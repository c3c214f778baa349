//! Database Error Types
//!
//! This module defines error types for driver operations. Drivers surface
//! their failures through `DatabaseError` and the access layer propagates
//! them unchanged, so callers keep the original diagnostic detail.

use thiserror::Error;

/// Database operation errors
///
/// "Not found" on a read is not an error (reads return `None`/empty);
/// `NotFound` is reserved for writes that target a missing document.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Write targeted a document that does not exist
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Backend unreachable or offline
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Field name cannot be used in a query against this backend
    #[error("Invalid field name: {field}")]
    InvalidField { field: String },

    /// SurrealDB client error
    #[cfg(feature = "surrealdb")]
    #[error("SurrealDB operation failed: {0}")]
    Surreal(#[from] surrealdb::Error),
}

impl DatabaseError {
    /// Create a not found error
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an invalid field error
    pub fn invalid_field(field: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
        }
    }

    /// True for the "write targeted a missing document" case
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
