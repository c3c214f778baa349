//! Lookup Policies
//!
//! A lookup policy decides how a single identifying value is resolved to
//! documents. It is attached to an entity at registration time and used
//! both by `filter` (when the predicate is exactly the natural key) and by
//! the explicit `lookup` call, so the two paths cannot drift apart.
//!
//! | Policy             | Equality on field | Id lookup              |
//! |--------------------|-------------------|------------------------|
//! | `Plain`            | never             | always                 |
//! | `NaturalKeyThenId` | first             | only if equality empty |
//! | `NaturalKeyOnly`   | always            | never                  |
//! | `IdOnly`           | never             | always                 |

use serde_json::Value;

use crate::db::{DatabaseError, DocumentStore};
use crate::models::{Document, FilterOptions, Predicate};

/// How an entity resolves an identifying value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupPolicy {
    /// No natural key; `filter` always runs a plain equality query
    #[default]
    Plain,

    /// Equality on `field`, falling back to the value as a document id
    NaturalKeyThenId { field: &'static str },

    /// Equality on `field` only; `singleton` caps the query at one result
    NaturalKeyOnly {
        field: &'static str,
        singleton: bool,
    },

    /// The value under `field` is a raw document id
    IdOnly { field: &'static str },
}

impl LookupPolicy {
    /// Field whose single-constraint predicates are routed through the policy
    pub fn natural_key(&self) -> Option<&'static str> {
        match *self {
            LookupPolicy::Plain => None,
            LookupPolicy::NaturalKeyThenId { field }
            | LookupPolicy::NaturalKeyOnly { field, .. }
            | LookupPolicy::IdOnly { field } => Some(field),
        }
    }

    /// Resolve `value` in `collection`
    ///
    /// Returns every equality match, or at most one document when the value
    /// is resolved as an id. A limit of zero returns nothing from either path.
    pub async fn resolve(
        &self,
        store: &DocumentStore,
        collection: &str,
        value: &Value,
        options: &FilterOptions,
    ) -> Result<Vec<Document>, DatabaseError> {
        if options.limit == Some(0) {
            return Ok(Vec::new());
        }

        match *self {
            LookupPolicy::Plain | LookupPolicy::IdOnly { .. } => {
                by_id(store, collection, value).await
            }
            LookupPolicy::NaturalKeyThenId { field } => {
                let predicate = Predicate::new().eq(field, value.clone());
                let matches = store.list_eq(collection, &predicate, options).await?;
                if !matches.is_empty() {
                    return Ok(matches);
                }

                tracing::debug!(collection, field, "No natural key match, trying document id");
                by_id(store, collection, value).await
            }
            LookupPolicy::NaturalKeyOnly { field, singleton } => {
                let predicate = Predicate::new().eq(field, value.clone());
                let mut options = options.clone();
                if singleton {
                    options.limit = Some(options.limit.map_or(1, |limit| limit.min(1)));
                }
                store.list_eq(collection, &predicate, &options).await
            }
        }
    }
}

async fn by_id(
    store: &DocumentStore,
    collection: &str,
    value: &Value,
) -> Result<Vec<Document>, DatabaseError> {
    Ok(store.get_by_id(collection, value).await?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDriver;
    use crate::models::Fields;
    use serde_json::json;
    use std::sync::Arc;

    const EVENTS: LookupPolicy = LookupPolicy::NaturalKeyThenId { field: "event_id" };

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    async fn setup() -> (DocumentStore, Arc<MemoryDriver>) {
        let driver = Arc::new(MemoryDriver::new());
        driver
            .insert_with_id("events", "doc-1", fields(json!({"event_id": "evt-42"})))
            .await;
        driver
            .insert_with_id("events", "doc-2", fields(json!({"event_id": "evt-7"})))
            .await;
        (DocumentStore::new(driver.clone()), driver)
    }

    #[test]
    fn test_natural_key() {
        assert_eq!(LookupPolicy::Plain.natural_key(), None);
        assert_eq!(EVENTS.natural_key(), Some("event_id"));
        assert_eq!(
            LookupPolicy::NaturalKeyOnly {
                field: "key",
                singleton: true
            }
            .natural_key(),
            Some("key")
        );
    }

    #[tokio::test]
    async fn test_equality_hit_skips_id_lookup() {
        let (store, driver) = setup().await;
        let before = driver.metrics().snapshot();

        let found = EVENTS
            .resolve(&store, "events", &json!("evt-42"), &FilterOptions::new())
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "doc-1");
        let delta = driver.metrics().snapshot().since(&before);
        assert_eq!(delta.queries, 1);
        assert_eq!(delta.gets, 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_document_id() {
        let (store, driver) = setup().await;
        let before = driver.metrics().snapshot();

        let found = EVENTS
            .resolve(&store, "events", &json!("doc-2"), &FilterOptions::new())
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("event_id"), Some("evt-7"));
        let delta = driver.metrics().snapshot().since(&before);
        assert_eq!((delta.queries, delta.gets), (1, 1));
    }

    #[tokio::test]
    async fn test_zero_limit_skips_id_fallback() {
        let (store, driver) = setup().await;
        let before = driver.metrics().snapshot();

        let found = EVENTS
            .resolve(
                &store,
                "events",
                &json!("doc-2"),
                &FilterOptions::new().with_limit(0),
            )
            .await
            .unwrap();

        assert!(found.is_empty());
        let delta = driver.metrics().snapshot().since(&before);
        assert_eq!((delta.queries, delta.gets), (0, 0));
    }

    #[tokio::test]
    async fn test_no_match_either_way_is_empty() {
        let (store, _) = setup().await;
        let found = EVENTS
            .resolve(&store, "events", &json!("nope"), &FilterOptions::new())
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_natural_key_only_never_uses_id() {
        let (store, _) = setup().await;
        let policy = LookupPolicy::NaturalKeyOnly {
            field: "event_id",
            singleton: false,
        };
        let found = policy
            .resolve(&store, "events", &json!("doc-1"), &FilterOptions::new())
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_singleton_caps_at_one() {
        let (store, driver) = setup().await;
        driver
            .insert_with_id("events", "doc-3", fields(json!({"event_id": "evt-42"})))
            .await;

        let policy = LookupPolicy::NaturalKeyOnly {
            field: "event_id",
            singleton: true,
        };
        let found = policy
            .resolve(
                &store,
                "events",
                &json!("evt-42"),
                &FilterOptions::new().with_limit(10),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_id_only_coerces_numeric_values() {
        let driver = Arc::new(MemoryDriver::new());
        driver
            .insert_with_id("schools", "17", fields(json!({"name": "Uni"})))
            .await;
        let store = DocumentStore::new(driver);

        let found = LookupPolicy::IdOnly { field: "id" }
            .resolve(&store, "schools", &json!(17), &FilterOptions::new())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "17");
    }
}
