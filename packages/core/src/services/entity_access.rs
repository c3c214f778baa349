//! Generic Entity Factory
//!
//! `EntityAccess` is the uniform CRUD handle every registered entity gets.
//! It adds two things on top of the `DocumentStore` primitives:
//!
//! - **Lookup policy**: a `filter` whose only active constraint is the
//!   entity's natural key is resolved through the entity's `LookupPolicy`
//!   (e.g. equality first, then document id)
//! - **Write decorator**: create payloads and update patches pass through
//!   the entity's `WriteDecorator` before reaching storage
//!
//! `EntityStore<T>` is the typed face of the same handle: payloads are
//! serialized from `T` and results come back as `Record<T>`.
//!
//! # Examples
//!
//! ```rust
//! use studyhub_core::db::MemoryDriver;
//! use studyhub_core::models::{Event, Predicate, FilterOptions};
//! use studyhub_core::services::EntityRegistry;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let registry = EntityRegistry::new(Arc::new(MemoryDriver::new()));
//! let events = registry.store::<Event>()?;
//!
//! let created = events
//!     .create(&Event {
//!         event_id: Some("evt-42".to_string()),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! // Equality on the natural key, or the raw document id, both resolve
//! let by_key = events.lookup("evt-42").await?;
//! let by_id = events.lookup(created.id.as_str()).await?;
//! assert_eq!(by_key, by_id);
//! # Ok::<(), studyhub_core::services::EntityError>(())
//! # });
//! ```

use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::clock::Clock;
use super::decorators::WriteDecorator;
use super::error::{EntityError, EntityResult};
use super::lookup::LookupPolicy;
use crate::db::DocumentStore;
use crate::models::{
    to_fields, Document, DocumentKey, Entity, Fields, FilterOptions, Predicate, Record,
    RemovedDocument, SortSpec,
};

/// One row of the entity table
///
/// Maps a domain name to its collection and attaches the lookup policy and
/// optional write decorator. Built with `const fn`s so the table can be a
/// `static`.
#[derive(Debug, Clone, Copy)]
pub struct EntityDefinition {
    /// Domain name (`"Event"`)
    pub name: &'static str,

    /// Collection name (`"events"`)
    pub collection: &'static str,

    pub lookup: LookupPolicy,
    pub decorator: Option<&'static dyn WriteDecorator>,
}

impl EntityDefinition {
    pub const fn new(name: &'static str, collection: &'static str) -> Self {
        Self {
            name,
            collection,
            lookup: LookupPolicy::Plain,
            decorator: None,
        }
    }

    pub const fn with_lookup(mut self, lookup: LookupPolicy) -> Self {
        self.lookup = lookup;
        self
    }

    pub const fn with_decorator(mut self, decorator: &'static dyn WriteDecorator) -> Self {
        self.decorator = Some(decorator);
        self
    }
}

/// Untyped CRUD handle for one entity
#[derive(Clone)]
pub struct EntityAccess {
    definition: EntityDefinition,
    store: DocumentStore,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for EntityAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityAccess")
            .field("definition", &self.definition)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl EntityAccess {
    pub fn new(definition: EntityDefinition, store: DocumentStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            definition,
            store,
            clock,
        }
    }

    pub fn definition(&self) -> &EntityDefinition {
        &self.definition
    }

    pub fn name(&self) -> &'static str {
        self.definition.name
    }

    pub fn collection(&self) -> &'static str {
        self.definition.collection
    }

    /// Fetch one document by id; `None` if absent
    pub async fn get(&self, id: impl DocumentKey) -> EntityResult<Option<Document>> {
        Ok(self.store.get_by_id(self.collection(), id).await?)
    }

    /// Equality filter with natural-key resolution
    ///
    /// If the predicate's only non-null constraint is the natural key, the
    /// entity's lookup policy resolves it. Any other predicate is a plain
    /// AND-of-equalities query.
    pub async fn filter(
        &self,
        predicate: &Predicate,
        options: &FilterOptions,
    ) -> EntityResult<Vec<Document>> {
        if let Some(key) = self.definition.lookup.natural_key() {
            if let Some((field, value)) = predicate.single_constraint() {
                if field == key {
                    tracing::debug!(
                        entity = self.name(),
                        field,
                        policy = ?self.definition.lookup,
                        "Resolving natural key"
                    );
                    return Ok(self
                        .definition
                        .lookup
                        .resolve(&self.store, self.collection(), value, options)
                        .await?);
                }
            }
        }

        Ok(self
            .store
            .list_eq(self.collection(), predicate, options)
            .await?)
    }

    /// Resolve an identifying value through the lookup policy
    ///
    /// For entities without a natural key the value is a document id.
    pub async fn lookup(&self, value: impl Into<Value>) -> EntityResult<Vec<Document>> {
        let value = value.into();
        Ok(self
            .definition
            .lookup
            .resolve(&self.store, self.collection(), &value, &FilterOptions::new())
            .await?)
    }

    /// Unfiltered listing, optionally sorted and capped
    pub async fn list(
        &self,
        sort: Option<SortSpec>,
        limit: Option<usize>,
    ) -> EntityResult<Vec<Document>> {
        let options = FilterOptions { limit, sort };
        Ok(self
            .store
            .list_eq(self.collection(), &Predicate::new(), &options)
            .await?)
    }

    /// Create a document; the decorator sees the payload first
    pub async fn create(&self, payload: Fields) -> EntityResult<Document> {
        let payload = match self.definition.decorator {
            Some(decorator) => decorator.before_create(payload, self.clock.now()),
            None => payload,
        };
        Ok(self.store.create_in(self.collection(), payload).await?)
    }

    /// Partially update a document; the decorator sees the patch first
    ///
    /// Fails with a not-found error if no document exists at `id`.
    pub async fn update(&self, id: impl DocumentKey, patch: Fields) -> EntityResult<Document> {
        let patch = match self.definition.decorator {
            Some(decorator) => decorator.before_update(patch, self.clock.now()),
            None => patch,
        };
        Ok(self.store.update_in(self.collection(), id, patch).await?)
    }

    /// Hard-delete a document; removing a missing id succeeds
    pub async fn remove(&self, id: impl DocumentKey) -> EntityResult<RemovedDocument> {
        Ok(self.store.remove_in(self.collection(), id).await?)
    }
}

/// Typed CRUD handle for one entity
pub struct EntityStore<T> {
    access: EntityAccess,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            access: self.access.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for EntityStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityStore").field(&self.access).finish()
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new(access: EntityAccess) -> Self {
        Self {
            access,
            _entity: PhantomData,
        }
    }

    /// The untyped handle underneath
    pub fn access(&self) -> &EntityAccess {
        &self.access
    }

    pub async fn get(&self, id: impl DocumentKey) -> EntityResult<Option<Record<T>>> {
        self.access.get(id).await?.map(to_record).transpose()
    }

    pub async fn filter(
        &self,
        predicate: &Predicate,
        options: &FilterOptions,
    ) -> EntityResult<Vec<Record<T>>> {
        to_records(self.access.filter(predicate, options).await?)
    }

    pub async fn lookup(&self, value: impl Into<Value>) -> EntityResult<Vec<Record<T>>> {
        to_records(self.access.lookup(value).await?)
    }

    pub async fn list(
        &self,
        sort: Option<SortSpec>,
        limit: Option<usize>,
    ) -> EntityResult<Vec<Record<T>>> {
        to_records(self.access.list(sort, limit).await?)
    }

    pub async fn create(&self, payload: &T) -> EntityResult<Record<T>> {
        let payload = payload_fields(payload)?;
        to_record(self.access.create(payload).await?)
    }

    /// Update with the fields set on `patch`
    ///
    /// Entity structs skip unset fields when serialized, so a mostly-default
    /// `T` is a partial patch.
    pub async fn update(&self, id: impl DocumentKey, patch: &T) -> EntityResult<Record<T>> {
        let patch = payload_fields(patch)?;
        to_record(self.access.update(id, patch).await?)
    }

    /// Update with raw fields (e.g. to set a field to `null`)
    pub async fn update_fields(
        &self,
        id: impl DocumentKey,
        patch: Fields,
    ) -> EntityResult<Record<T>> {
        to_record(self.access.update(id, patch).await?)
    }

    pub async fn remove(&self, id: impl DocumentKey) -> EntityResult<RemovedDocument> {
        self.access.remove(id).await
    }
}

fn payload_fields<T: Entity>(payload: &T) -> EntityResult<Fields> {
    to_fields(payload)?.ok_or_else(|| {
        EntityError::invalid_payload(format!("{} payload must serialize to an object", T::NAME))
    })
}

fn to_record<T: Entity>(doc: Document) -> EntityResult<Record<T>> {
    Ok(Record::try_from(doc)?)
}

fn to_records<T: Entity>(docs: Vec<Document>) -> EntityResult<Vec<Record<T>>> {
    docs.into_iter().map(to_record).collect()
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "entity_access_test.rs"]
mod entity_access_test;
