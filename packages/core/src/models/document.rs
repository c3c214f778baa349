//! Document Model
//!
//! A `Document` is one stored record: a system-assigned identifier plus an
//! open-ended JSON object of fields. The core never defines entity shapes;
//! it only guarantees that every document it hands back carries exactly one
//! `id`, taken from the document's address.
//!
//! # Serialized Form
//!
//! Documents serialize as a flat JSON object with `id` merged in:
//!
//! ```rust
//! use studyhub_core::models::Document;
//! use serde_json::json;
//!
//! let doc = Document::from_stored(
//!     "abc123",
//!     json!({"company_name": "Acme"}).as_object().cloned().unwrap(),
//! );
//! let value = serde_json::to_value(&doc).unwrap();
//! assert_eq!(value, json!({"id": "abc123", "company_name": "Acme"}));
//! ```

use serde::de::{self, DeserializeOwned};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Field map of a stored document (everything except its address)
pub type Fields = Map<String, Value>;

/// Name of the identifier field merged into every returned document
pub const ID_FIELD: &str = "id";

/// One stored record with its address merged in
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Identifier assigned by the driver, stable for the document's lifetime
    pub id: String,

    /// Stored fields, never containing `id`
    pub fields: Fields,
}

impl Document {
    /// Build a document from its address and stored fields
    ///
    /// If the stored fields happen to contain an `id` key, it is dropped:
    /// the address always takes precedence.
    pub fn from_stored(id: impl Into<String>, mut fields: Fields) -> Self {
        fields.remove(ID_FIELD);
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Get a stored field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a string field value
    pub fn get_str(&self, field: &str) -> Option<&str> {
        if field == ID_FIELD {
            return Some(&self.id);
        }
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Convert into a flat JSON object with `id` merged in
    pub fn into_value(self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        map.insert(ID_FIELD.to_string(), Value::String(self.id));
        map.extend(self.fields);
        Value::Object(map)
    }

    /// Deserialize the document (including `id`) into a typed value
    pub fn deserialize_into<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.into_value())
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_FIELD, &self.id)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Fields::deserialize(deserializer)?;
        let id = fields
            .remove(ID_FIELD)
            .ok_or_else(|| de::Error::missing_field(ID_FIELD))?;
        Ok(Self {
            id: coerce_id(&id),
            fields,
        })
    }
}

/// Confirmation returned by a remove operation
///
/// Removal is idempotent: removing an id that does not exist succeeds with
/// `existed: false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedDocument {
    /// Identifier that was removed
    pub id: String,

    /// Whether a document existed at that id before the call
    pub existed: bool,
}

/// Typed view of a document: its `id` plus a deserialized body
///
/// `T` sees every stored field except `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: String,

    #[serde(flatten)]
    pub data: T,
}

impl<T: DeserializeOwned> TryFrom<Document> for Record<T> {
    type Error = serde_json::Error;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        doc.deserialize_into()
    }
}

/// Anything that can address a document
///
/// Callers pass identifiers of many shapes (strings, numbers, raw JSON
/// values taken from a predicate); all of them are coerced to the string
/// form the driver addresses documents by.
pub trait DocumentKey {
    fn to_document_id(&self) -> String;
}

impl DocumentKey for str {
    fn to_document_id(&self) -> String {
        self.to_string()
    }
}

impl DocumentKey for String {
    fn to_document_id(&self) -> String {
        self.clone()
    }
}

impl DocumentKey for Value {
    fn to_document_id(&self) -> String {
        coerce_id(self)
    }
}

impl DocumentKey for uuid::Uuid {
    fn to_document_id(&self) -> String {
        self.to_string()
    }
}

impl<T: DocumentKey + ?Sized> DocumentKey for &T {
    fn to_document_id(&self) -> String {
        (**self).to_document_id()
    }
}

macro_rules! integer_document_key {
    ($($ty:ty),*) => {
        $(
            impl DocumentKey for $ty {
                fn to_document_id(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_document_key!(i32, i64, u32, u64, usize);

/// Coerce a JSON value to the string form used as a document address
///
/// Strings are used verbatim, numbers and booleans use their literal text,
/// arrays join their coerced elements with commas, and objects fall back to
/// their JSON text.
pub fn coerce_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items.iter().map(coerce_id).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Convert any serializable value into a field map
///
/// Returns `None` if the value does not serialize to a JSON object.
pub fn to_fields<T: Serialize + ?Sized>(value: &T) -> Result<Option<Fields>, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Ok(None),
    }
}
