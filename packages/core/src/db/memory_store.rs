//! MemoryDriver - In-Process DocumentDriver Implementation
//!
//! Keeps every collection in memory behind a tokio `RwLock`. Used by tests,
//! benchmarks and the dev tool, and as the default backend when no database
//! is configured.
//!
//! Beyond plain storage it offers the hooks a test harness needs:
//!
//! - **Server timestamps**: optionally stamps a creation time on insert, the
//!   way managed document stores inject server-side fields
//! - **Metrics**: round-trip counters per operation (`DriverMetrics`)
//! - **Offline switch**: every call fails with `DatabaseError::Unavailable`
//! - **Change feed**: `StoreEvent`s over a broadcast channel
//!
//! Results come back in insertion order unless a sort is requested.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::driver::{DocumentDriver, DocumentQuery, StoredDocument};
use super::error::DatabaseError;
use super::events::StoreEvent;
use super::metrics::{DriverMetrics, DriverOperation};
use crate::models::{Fields, SortDirection};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct StoredEntry {
    seq: u64,
    fields: Fields,
}

/// In-memory document driver
pub struct MemoryDriver {
    collections: RwLock<HashMap<String, HashMap<String, StoredEntry>>>,
    next_seq: AtomicU64,
    server_timestamp_field: Option<String>,
    offline: AtomicBool,
    metrics: Arc<DriverMetrics>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            collections: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            server_timestamp_field: None,
            offline: AtomicBool::new(false),
            metrics: Arc::new(DriverMetrics::new()),
            events,
        }
    }

    /// Stamp `field` with the insert time on every new document that does
    /// not already carry it
    pub fn with_server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamp_field = Some(field.into());
        self
    }

    /// Seed a document at a known id (bypasses id generation)
    pub async fn insert_with_id(&self, collection: &str, id: &str, fields: Fields) {
        let seq = self.next_seq.fetch_add(1, AtomicOrdering::Relaxed);
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), StoredEntry { seq, fields });
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    pub fn metrics(&self) -> Arc<DriverMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Subscribe to the change feed
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Number of documents currently stored in `collection`
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    fn begin(&self, operation: DriverOperation) -> Result<(), DatabaseError> {
        self.metrics.record(operation);
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(DatabaseError::unavailable("memory driver is offline"));
        }
        Ok(())
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentDriver for MemoryDriver {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, DatabaseError> {
        self.begin(DriverOperation::Get)?;

        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|entry| entry.fields.clone()))
    }

    async fn query(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<StoredDocument>, DatabaseError> {
        self.begin(DriverOperation::Query)?;

        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<(&String, &StoredEntry)> = docs
            .iter()
            .filter(|(_, entry)| query.matches(&entry.fields))
            .collect();

        matches.sort_by_key(|(_, entry)| entry.seq);

        if let Some(sort) = &query.sort {
            // Stable sort keeps insertion order among equal keys
            matches.sort_by(|(_, a), (_, b)| {
                let ordering =
                    compare_field_values(a.fields.get(&sort.field), b.fields.get(&sort.field));
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matches
            .into_iter()
            .take(limit)
            .map(|(id, entry)| StoredDocument::new(id.clone(), entry.fields.clone()))
            .collect())
    }

    async fn insert(&self, collection: &str, mut fields: Fields) -> Result<String, DatabaseError> {
        self.begin(DriverOperation::Insert)?;

        if let Some(field) = &self.server_timestamp_field {
            if !fields.contains_key(field) {
                fields.insert(
                    field.clone(),
                    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
                );
            }
        }

        let id = Uuid::new_v4().to_string();
        let seq = self.next_seq.fetch_add(1, AtomicOrdering::Relaxed);

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(
                id.clone(),
                StoredEntry {
                    seq,
                    fields: fields.clone(),
                },
            );

        self.emit(StoreEvent::Created {
            collection: collection.to_string(),
            id: id.clone(),
            fields,
        });

        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
    ) -> Result<(), DatabaseError> {
        self.begin(DriverOperation::Update)?;

        let merged = {
            let mut collections = self.collections.write().await;
            let entry = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| DatabaseError::not_found(collection, id))?;

            entry.fields.extend(patch);
            entry.fields.clone()
        };

        self.emit(StoreEvent::Updated {
            collection: collection.to_string(),
            id: id.to_string(),
            fields: merged,
        });

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, DatabaseError> {
        self.begin(DriverOperation::Delete)?;

        let existed = self
            .collections
            .write()
            .await
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();

        if existed {
            self.emit(StoreEvent::Deleted {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        Ok(existed)
    }
}

/// Total order over optional JSON values used for sorting
///
/// missing < null < bool < number < string < array < object. Numbers compare
/// numerically, strings lexically; arrays and objects of the same kind are
/// considered equal.
fn compare_field_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(Value::Array(_)) => 5,
            Some(Value::Object(_)) => 6,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortSpec;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_get_update_delete() {
        let driver = MemoryDriver::new();

        let id = driver
            .insert("agents", fields(json!({"x": 0, "y": 2})))
            .await
            .unwrap();
        assert!(!id.is_empty());

        driver
            .update("agents", &id, fields(json!({"x": 1})))
            .await
            .unwrap();
        let stored = driver.get("agents", &id).await.unwrap().unwrap();
        assert_eq!(stored, fields(json!({"x": 1, "y": 2})));

        assert!(driver.delete("agents", &id).await.unwrap());
        assert!(!driver.delete("agents", &id).await.unwrap());
        assert!(driver.get("agents", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let driver = MemoryDriver::new();
        let err = driver
            .update("agents", "nope", Fields::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_query_preserves_insertion_order_and_limit() {
        let driver = MemoryDriver::new();
        for n in 0..5 {
            driver
                .insert("events", fields(json!({"n": n, "kind": "fair"})))
                .await
                .unwrap();
        }

        let query = DocumentQuery {
            filters: vec![("kind".to_string(), json!("fair"))],
            limit: Some(3),
            ..Default::default()
        };
        let rows = driver.query("events", &query).await.unwrap();
        let ns: Vec<_> = rows.iter().map(|r| r.fields["n"].clone()).collect();
        assert_eq!(ns, vec![json!(0), json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn test_query_sort_descending_with_missing_values_last() {
        let driver = MemoryDriver::new();
        driver
            .insert("events", fields(json!({"title": "b", "rank": 2})))
            .await
            .unwrap();
        driver
            .insert("events", fields(json!({"title": "none"})))
            .await
            .unwrap();
        driver
            .insert("events", fields(json!({"title": "a", "rank": 10})))
            .await
            .unwrap();

        let query = DocumentQuery {
            sort: Some(SortSpec::descending("rank")),
            ..Default::default()
        };
        let rows = driver.query("events", &query).await.unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r.fields["title"].clone()).collect();
        assert_eq!(titles, vec![json!("a"), json!("b"), json!("none")]);
    }

    #[tokio::test]
    async fn test_server_timestamp_injected_on_insert() {
        let driver = MemoryDriver::new().with_server_timestamp("created_at");
        let id = driver
            .insert("agents", fields(json!({"company_name": "Acme"})))
            .await
            .unwrap();

        let stored = driver.get("agents", &id).await.unwrap().unwrap();
        assert!(stored.get("created_at").and_then(Value::as_str).is_some());
    }

    #[tokio::test]
    async fn test_offline_driver_fails_every_call() {
        let driver = MemoryDriver::new();
        driver.set_offline(true);

        let err = driver.get("agents", "a1").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Unavailable(_)));

        driver.set_offline(false);
        assert!(driver.get("agents", "a1").await.unwrap().is_none());
        assert_eq!(driver.metrics().snapshot().gets, 2);
    }

    #[tokio::test]
    async fn test_change_feed_emits_after_writes() {
        let driver = MemoryDriver::new();
        let mut rx = driver.subscribe();

        let id = driver
            .insert("payments", fields(json!({"amount": 10})))
            .await
            .unwrap();
        driver
            .update("payments", &id, fields(json!({"status": "verified"})))
            .await
            .unwrap();
        driver.delete("payments", &id).await.unwrap();

        let created = rx.recv().await.unwrap();
        assert_eq!(created.event_type(), "document:created");
        assert_eq!(created.id(), id);

        match rx.recv().await.unwrap() {
            StoreEvent::Updated { fields: merged, .. } => {
                assert_eq!(merged, fields(json!({"amount": 10, "status": "verified"})));
            }
            other => panic!("Expected Updated event, got {:?}", other),
        }

        assert_eq!(rx.recv().await.unwrap().event_type(), "document:deleted");
    }

    #[test]
    fn test_compare_field_values_ranks() {
        assert_eq!(
            compare_field_values(None, Some(&Value::Null)),
            Ordering::Less
        );
        assert_eq!(
            compare_field_values(Some(&json!(2)), Some(&json!(10.5))),
            Ordering::Less
        );
        assert_eq!(
            compare_field_values(Some(&json!("b")), Some(&json!("a"))),
            Ordering::Greater
        );
        assert_eq!(
            compare_field_values(Some(&json!(100)), Some(&json!("1"))),
            Ordering::Less
        );
    }
}
