//! SurrealDriver - DocumentDriver Implementation for SurrealDB
//!
//! Embedded SurrealDB backend (RocksDB on disk, or the in-memory engine).
//!
//! # Storage Layout
//!
//! - One SCHEMALESS table per collection, created on first write
//! - Record ID: `collection:<uuid>` where the uuid is generated here
//! - Record body: `{ data: <document fields> }` so caller fields can never
//!   collide with SurrealDB's own `id`
//!
//! Updates merge the patch inside SurrealDB in a single statement, so two
//! concurrent patches touching different fields both survive. Deletes use
//! `RETURN BEFORE` to report whether the record existed.
//!
//! Field names from predicates and sort specs are spliced into SurrealQL,
//! so they are validated against `[A-Za-z_][A-Za-z0-9_]*` first; values are
//! always bound as parameters.
//!
//! # Examples
//!
//! ```rust,no_run
//! use studyhub_core::db::{DocumentDriver, SurrealDriver};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let driver = SurrealDriver::new(PathBuf::from("./data/studyhub.db"), "studyhub", "core").await?;
//!     let agent = driver.get("agents", "550e8400-e29b-41d4-a716-446655440000").await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use surrealdb::engine::local::{Db, Mem, RocksDb};
use surrealdb::Surreal;
use uuid::Uuid;

use super::driver::{DocumentDriver, DocumentQuery, StoredDocument};
use super::error::DatabaseError;
use crate::models::{Fields, SortDirection};

const FIELD_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Marker in SurrealDB's message for a read/write transaction conflict
const RETRYABLE_CONFLICT: &str = "can be retried";
const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Row shape returned by every SELECT this driver issues
#[derive(Debug, Deserialize)]
struct SurrealRow {
    id: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Row shape for write statements; only the presence of a row matters
#[derive(Debug, Deserialize)]
struct DataRow {
    #[serde(default)]
    #[allow(dead_code)]
    data: Option<Value>,
}

impl SurrealRow {
    fn into_stored(self) -> StoredDocument {
        let fields = match self.data {
            Some(Value::Object(map)) => map,
            _ => Fields::new(),
        };
        StoredDocument::new(self.id, fields)
    }
}

/// SurrealDriver implements DocumentDriver for embedded SurrealDB
pub struct SurrealDriver {
    db: Arc<Surreal<Db>>,
}

impl SurrealDriver {
    /// Open (or create) a RocksDB-backed database at `db_path`
    pub async fn new(
        db_path: PathBuf,
        namespace: &str,
        database: &str,
    ) -> Result<Self, DatabaseError> {
        let db = Surreal::new::<RocksDb>(db_path).await?;
        Self::bootstrap(db, namespace, database).await
    }

    /// Start an in-memory database (contents vanish with the process)
    pub async fn new_in_memory(namespace: &str, database: &str) -> Result<Self, DatabaseError> {
        let db = Surreal::new::<Mem>(()).await?;
        Self::bootstrap(db, namespace, database).await
    }

    async fn bootstrap(
        db: Surreal<Db>,
        namespace: &str,
        database: &str,
    ) -> Result<Self, DatabaseError> {
        db.use_ns(namespace).use_db(database).await?;
        tracing::info!(namespace, database, "SurrealDB document driver ready");

        Ok(Self { db: Arc::new(db) })
    }

    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Fields>, DatabaseError> {
        let mut response = self
            .db
            .query("SELECT meta::id(id) AS id, data FROM type::thing($table, $id);")
            .bind(("table", collection.to_string()))
            .bind(("id", id.to_string()))
            .await?;

        let rows: Vec<SurrealRow> = response.take(0)?;
        Ok(rows.into_iter().next().map(|row| row.into_stored().fields))
    }

    /// Merge `patch` into the stored `data` object in one statement
    ///
    /// Top-level keys in `patch` replace the stored ones; nested objects are
    /// not merged. Returns `false` when the record does not exist.
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: &Fields,
    ) -> Result<bool, surrealdb::Error> {
        let mut response = self
            .db
            .query(
                "UPDATE type::thing($table, $id) SET data = object::from_entries(\
                 array::concat(object::entries(data), object::entries($patch))) \
                 RETURN AFTER;",
            )
            .bind(("table", collection.to_string()))
            .bind(("id", id.to_string()))
            .bind(("patch", Value::Object(patch.clone())))
            .await?;

        let rows: Vec<DataRow> = response.take(0)?;
        Ok(!rows.is_empty())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, surrealdb::Error> {
        let mut response = self
            .db
            .query("DELETE type::thing($table, $id) RETURN BEFORE;")
            .bind(("table", collection.to_string()))
            .bind(("id", id.to_string()))
            .await?;

        let rows: Vec<DataRow> = response.take(0)?;
        Ok(!rows.is_empty())
    }
}

/// Run a single-record write, retrying transaction conflicts
///
/// Concurrent writes to one record can abort with a retryable conflict;
/// the statement is re-run up to `MAX_WRITE_ATTEMPTS` times.
async fn with_conflict_retry<F, Fut>(
    collection: &str,
    id: &str,
    mut write: F,
) -> Result<bool, DatabaseError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<bool, surrealdb::Error>>,
{
    let mut attempt = 1;
    loop {
        match write().await {
            Ok(existed) => return Ok(existed),
            Err(err) if attempt < MAX_WRITE_ATTEMPTS && is_conflict(&err) => {
                tracing::debug!(collection, id, attempt, "Write conflict, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn is_conflict(err: &surrealdb::Error) -> bool {
    err.to_string().contains(RETRYABLE_CONFLICT)
}

fn validate_field(field: &str) -> Result<&str, DatabaseError> {
    static FIELD_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = FIELD_REGEX.get_or_init(|| {
        Regex::new(FIELD_NAME_PATTERN).expect("field name pattern is a valid regex")
    });

    if regex.is_match(field) {
        Ok(field)
    } else {
        Err(DatabaseError::invalid_field(field))
    }
}

/// Build the SELECT statement for an equality query
///
/// Returns the SurrealQL text plus the `(name, value)` bindings for each
/// constraint.
fn build_select(query: &DocumentQuery) -> Result<(String, Vec<(String, Value)>), DatabaseError> {
    let mut sql = String::from("SELECT meta::id(id) AS id, data");
    let mut bindings = Vec::with_capacity(query.filters.len());
    let mut conditions = Vec::with_capacity(query.filters.len());

    if let Some(sort) = &query.sort {
        sql.push_str(&format!(", data.{} AS sort_key", validate_field(&sort.field)?));
    }
    sql.push_str(" FROM type::table($table)");

    for (index, (field, value)) in query.filters.iter().enumerate() {
        let param = format!("f{}", index);
        conditions.push(format!("data.{} = ${}", validate_field(field)?, param));
        bindings.push((param, value.clone()));
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    if let Some(sort) = &query.sort {
        let direction = match sort.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        sql.push_str(&format!(" ORDER BY sort_key {}", direction));
    }

    if query.limit.is_some() {
        sql.push_str(" LIMIT $limit");
    }
    sql.push(';');

    Ok((sql, bindings))
}

#[async_trait]
impl DocumentDriver for SurrealDriver {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, DatabaseError> {
        self.fetch(collection, id).await
    }

    async fn query(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> Result<Vec<StoredDocument>, DatabaseError> {
        let (sql, bindings) = build_select(query)?;

        let mut query_builder = self.db.query(sql).bind(("table", collection.to_string()));
        for binding in bindings {
            query_builder = query_builder.bind(binding);
        }
        if let Some(limit) = query.limit {
            query_builder = query_builder.bind(("limit", limit));
        }

        let mut response = query_builder.await?;
        let rows: Vec<SurrealRow> = response.take(0)?;
        Ok(rows.into_iter().map(SurrealRow::into_stored).collect())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, DatabaseError> {
        let id = Uuid::new_v4().to_string();

        self.db
            .query("CREATE type::thing($table, $id) CONTENT { data: $data };")
            .bind(("table", collection.to_string()))
            .bind(("id", id.clone()))
            .bind(("data", Value::Object(fields)))
            .await?
            .check()?;

        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
    ) -> Result<(), DatabaseError> {
        let existed =
            with_conflict_retry(collection, id, || self.merge(collection, id, &patch)).await?;

        if existed {
            Ok(())
        } else {
            Err(DatabaseError::not_found(collection, id))
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, DatabaseError> {
        with_conflict_retry(collection, id, || self.remove(collection, id)).await
    }
}
