//! Write Decorators
//!
//! A decorator rewrites payloads on their way to storage: `before_create`
//! sees every create payload and `before_update` every update patch. Both
//! are pure functions of their input and the supplied instant, so the
//! defaulting behaviour can be tested without a driver.
//!
//! # Examples
//!
//! ```rust
//! use studyhub_core::services::{StampDefaults, WriteDecorator};
//! use chrono::{TimeZone, Utc};
//! use serde_json::json;
//!
//! let stamps = StampDefaults::new().with_status("pending");
//! let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
//!
//! let payload = json!({"event_id": "evt-42"}).as_object().cloned().unwrap();
//! let stamped = stamps.before_create(payload, now);
//!
//! assert_eq!(stamped["status"], "pending");
//! assert_eq!(stamped["created_date"], "2024-05-01T09:30:00.000Z");
//! ```

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;

use super::clock::timestamp;
use crate::models::Fields;

/// Hook applied to payloads before they reach storage
pub trait WriteDecorator: fmt::Debug + Send + Sync {
    fn before_create(&self, payload: Fields, _now: DateTime<Utc>) -> Fields {
        payload
    }

    fn before_update(&self, patch: Fields, _now: DateTime<Utc>) -> Fields {
        patch
    }
}

/// Declarative status and timestamp defaults
///
/// On create, caller fields are merged over
/// `{status, created_date: now, updated_date: now}`; a field the caller set
/// wins even when set to `null`. On update, `updated_date` is always
/// overwritten with `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampDefaults {
    pub status: Option<&'static str>,
    pub created_field: &'static str,
    pub updated_field: &'static str,
}

impl StampDefaults {
    pub const fn new() -> Self {
        Self {
            status: None,
            created_field: "created_date",
            updated_field: "updated_date",
        }
    }

    pub const fn with_status(mut self, status: &'static str) -> Self {
        self.status = Some(status);
        self
    }

    pub const fn with_fields(mut self, created: &'static str, updated: &'static str) -> Self {
        self.created_field = created;
        self.updated_field = updated;
        self
    }
}

impl Default for StampDefaults {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteDecorator for StampDefaults {
    fn before_create(&self, payload: Fields, now: DateTime<Utc>) -> Fields {
        let stamp = Value::String(timestamp(now));

        let mut base = Fields::new();
        if let Some(status) = self.status {
            base.insert("status".to_string(), Value::String(status.to_string()));
        }
        base.insert(self.created_field.to_string(), stamp.clone());
        base.insert(self.updated_field.to_string(), stamp);

        base.extend(payload);
        base
    }

    fn before_update(&self, mut patch: Fields, now: DateTime<Utc>) -> Fields {
        patch.insert(
            self.updated_field.to_string(),
            Value::String(timestamp(now)),
        );
        patch
    }
}
