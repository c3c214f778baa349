//! Query Model
//!
//! Equality-only predicates, sort specifications and filter options.
//!
//! # Query Semantics
//!
//! - All predicate fields are combined with AND logic
//! - Only equality is supported, so the backing store never needs a
//!   multi-field composite index
//! - Fields whose value is `null` are skipped (no constraint on that field)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::document::Fields;

/// Equality predicate: field name → required value
///
/// # Examples
///
/// ```rust
/// use studyhub_core::models::Predicate;
///
/// let predicate = Predicate::new()
///     .eq("status", "pending")
///     .eq_opt("agent_id", None::<String>);
///
/// // `agent_id` is present but unconstrained
/// assert_eq!(predicate.active_len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicate(BTreeMap<String, Value>);

impl Predicate {
    /// Create an empty predicate (matches every document)
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Require `field` to equal `value` when present; `None` leaves the
    /// field unconstrained
    pub fn eq_opt<V: Into<Value>>(mut self, field: impl Into<String>, value: Option<V>) -> Self {
        self.0
            .insert(field.into(), value.map(Into::into).unwrap_or(Value::Null));
        self
    }

    /// Build a predicate from a field map
    pub fn from_fields(fields: Fields) -> Self {
        Self(fields.into_iter().collect())
    }

    /// Active constraints, skipping `null` values
    pub fn constraints(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(field, value)| (field.as_str(), value))
    }

    /// Number of active constraints
    pub fn active_len(&self) -> usize {
        self.constraints().count()
    }

    /// The only active constraint, if there is exactly one
    pub fn single_constraint(&self) -> Option<(&str, &Value)> {
        let mut constraints = self.constraints();
        let first = constraints.next()?;
        match constraints.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    /// True if no active constraint remains
    pub fn is_unconstrained(&self) -> bool {
        self.active_len() == 0
    }
}

impl From<Fields> for Predicate {
    fn from(fields: Fields) -> Self {
        Self::from_fields(fields)
    }
}

/// Sort direction for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort specification: a field name and a direction
///
/// The string form is the field name, optionally prefixed with `-` for
/// descending order (`"-created_date"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Sort ascending by `field`
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Sort descending by `field`
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parse `"field"`, `"+field"` or `"-field"`
    ///
    /// Returns `None` for an empty spec.
    ///
    /// ```rust
    /// use studyhub_core::models::{SortDirection, SortSpec};
    ///
    /// let spec = SortSpec::parse("-created_date").unwrap();
    /// assert_eq!(spec.field, "created_date");
    /// assert_eq!(spec.direction, SortDirection::Descending);
    /// assert!(SortSpec::parse("  ").is_none());
    /// ```
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        let (field, direction) = match spec.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Descending),
            None => (
                spec.strip_prefix('+').unwrap_or(spec),
                SortDirection::Ascending,
            ),
        };

        if field.is_empty() {
            return None;
        }

        Some(Self {
            field: field.to_string(),
            direction,
        })
    }

    pub fn is_descending(&self) -> bool {
        self.direction == SortDirection::Descending
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "{}", self.field),
            SortDirection::Descending => write!(f, "-{}", self.field),
        }
    }
}

/// Options accepted by filter and list operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Cap on the number of results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Order requested from the driver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}
