//! DocumentDriver Trait - Database Abstraction Layer
//!
//! This module defines the `DocumentDriver` trait: the minimal capability set
//! the access layer needs from a document database. Everything above it
//! (primitives, entity factory, overrides) is backend-agnostic.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so embedded and networked
//!    backends fit behind the same trait
//! 2. **Equality-Only Queries**: `DocumentQuery` carries AND-combined equality
//!    constraints plus an optional sort and limit, nothing more
//! 3. **Raw Rows**: Drivers return stored fields and addresses separately;
//!    `DocumentStore` merges them into `Document`s so the `id` invariant is
//!    enforced in one place
//! 4. **Typed Errors**: `DatabaseError` keeps "missing on write" distinguishable
//!    from transport failures
//!
//! # Consistency
//!
//! Implementations must give read-your-writes to a single caller: a read
//! issued after a write completes observes that write.

use async_trait::async_trait;
use serde_json::Value;

use super::error::DatabaseError;
use crate::models::{Fields, FilterOptions, Predicate, SortSpec};

/// A stored row as returned by a driver: address plus raw fields
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Equality query handed to a driver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    /// AND-combined equality constraints (never contains `null` values)
    pub filters: Vec<(String, Value)>,

    /// Requested order of results
    pub sort: Option<SortSpec>,

    /// Cap on result count
    pub limit: Option<usize>,
}

impl DocumentQuery {
    /// Build a driver query from a predicate and filter options
    ///
    /// Skipped (`null`) predicate fields are not forwarded.
    pub fn from_predicate(predicate: &Predicate, options: &FilterOptions) -> Self {
        Self {
            filters: predicate
                .constraints()
                .map(|(field, value)| (field.to_string(), value.clone()))
                .collect(),
            sort: options.sort.clone(),
            limit: options.limit,
        }
    }

    /// True if `fields` satisfies every equality constraint
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| fields.get(field) == Some(expected))
    }
}

/// Abstraction over the external document database
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a single driver is shared behind an
/// `Arc` by every entity handle.
///
/// # Method Semantics
///
/// - `get` returns `Ok(None)` for a missing document, never an error
/// - `query` returns rows matching all filters, sorted and truncated as asked
/// - `insert` assigns and returns a new identifier
/// - `update` merges top-level fields and fails with `DatabaseError::NotFound`
///   when the document does not exist
/// - `delete` returns whether a document existed; deleting a missing id is
///   not an error
#[async_trait]
pub trait DocumentDriver: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, DatabaseError>;

    async fn query(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<StoredDocument>, DatabaseError>;

    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, DatabaseError>;

    async fn update(&self, collection: &str, id: &str, patch: Fields)
        -> Result<(), DatabaseError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, DatabaseError>;
}
