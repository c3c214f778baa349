//! DocumentStore - CRUD Primitives
//!
//! The five primitives every entity handle is built from. Each one makes the
//! driver round trips it needs and normalizes the result into `Document`s
//! carrying their `id`.
//!
//! | Primitive    | Round trips     | Missing document           |
//! |--------------|-----------------|----------------------------|
//! | `get_by_id`  | 1 read          | `Ok(None)`                 |
//! | `list_eq`    | 1 query         | `Ok(vec![])`               |
//! | `create_in`  | 1 write, 1 read | n/a                        |
//! | `update_in`  | 1 write, 1 read | `Err(DatabaseError::NotFound)` |
//! | `remove_in`  | 1 delete        | `Ok(existed: false)`       |
//!
//! # Examples
//!
//! ```rust
//! use studyhub_core::db::{DocumentStore, MemoryDriver};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let store = DocumentStore::new(Arc::new(MemoryDriver::new()));
//!
//! let payload = json!({"company_name": "Acme"}).as_object().cloned().unwrap();
//! let created = store.create_in("agents", payload).await?;
//! assert!(!created.id.is_empty());
//!
//! let fetched = store.get_by_id("agents", &created.id).await?;
//! assert_eq!(fetched, Some(created));
//! # Ok::<(), studyhub_core::db::DatabaseError>(())
//! # });
//! ```

use std::sync::Arc;

use super::driver::{DocumentDriver, DocumentQuery};
use super::error::DatabaseError;
use crate::models::{
    Document, DocumentKey, Fields, FilterOptions, Predicate, RemovedDocument, ID_FIELD,
};

/// CRUD primitives over a shared driver
///
/// Stateless façade: cloning is cheap and every clone talks to the same
/// driver.
#[derive(Clone)]
pub struct DocumentStore {
    driver: Arc<dyn DocumentDriver>,
}

impl DocumentStore {
    pub fn new(driver: Arc<dyn DocumentDriver>) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &Arc<dyn DocumentDriver> {
        &self.driver
    }

    /// Read one document by id
    ///
    /// Non-string keys are coerced to their string form. An empty id cannot
    /// address any document and returns `None` without a round trip.
    pub async fn get_by_id(
        &self,
        collection: &str,
        id: impl DocumentKey,
    ) -> Result<Option<Document>, DatabaseError> {
        let id = id.to_document_id();
        if id.is_empty() {
            tracing::debug!(collection, "get_by_id called with empty id");
            return Ok(None);
        }

        tracing::debug!(collection, id = %id, "get_by_id");
        let fields = self.driver.get(collection, &id).await?;
        Ok(fields.map(|fields| Document::from_stored(id, fields)))
    }

    /// Equality query: AND of every non-null predicate field
    pub async fn list_eq(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: &FilterOptions,
    ) -> Result<Vec<Document>, DatabaseError> {
        let query = DocumentQuery::from_predicate(predicate, options);
        tracing::debug!(
            collection,
            constraints = query.filters.len(),
            limit = ?query.limit,
            sort = ?query.sort.as_ref().map(ToString::to_string),
            "list_eq"
        );

        let rows = self.driver.query(collection, &query).await?;
        Ok(rows
            .into_iter()
            .map(|row| Document::from_stored(row.id, row.fields))
            .collect())
    }

    /// Insert a new document and return it as persisted
    ///
    /// A caller-supplied `id` is stripped: identifiers are always assigned
    /// by the driver.
    pub async fn create_in(
        &self,
        collection: &str,
        mut payload: Fields,
    ) -> Result<Document, DatabaseError> {
        if payload.remove(ID_FIELD).is_some() {
            tracing::warn!(collection, "Ignoring caller-supplied id on create");
        }

        let id = self.driver.insert(collection, payload).await?;
        tracing::debug!(collection, id = %id, "create_in");

        self.get_by_id(collection, &id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(collection, id))
    }

    /// Merge `patch` onto an existing document and return the result
    ///
    /// Fields absent from the patch keep their values. Fails with
    /// `DatabaseError::NotFound` if nothing exists at `id`.
    pub async fn update_in(
        &self,
        collection: &str,
        id: impl DocumentKey,
        mut patch: Fields,
    ) -> Result<Document, DatabaseError> {
        let id = id.to_document_id();
        if patch.remove(ID_FIELD).is_some() {
            tracing::debug!(collection, id = %id, "Dropping id from update patch");
        }

        tracing::debug!(collection, id = %id, fields = patch.len(), "update_in");
        self.driver.update(collection, &id, patch).await?;

        self.get_by_id(collection, &id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(collection, id))
    }

    /// Hard-delete a document
    ///
    /// Idempotent: a missing document yields `existed: false`.
    pub async fn remove_in(
        &self,
        collection: &str,
        id: impl DocumentKey,
    ) -> Result<RemovedDocument, DatabaseError> {
        let id = id.to_document_id();
        let existed = self.driver.delete(collection, &id).await?;
        tracing::debug!(collection, id = %id, existed, "remove_in");

        Ok(RemovedDocument { id, existed })
    }
}
