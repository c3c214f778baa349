//! Domain Entities
//!
//! Typed views over the documents the StudyHub pages store. The core is
//! schema-agnostic, so every domain field is optional and each struct keeps
//! unknown fields in `extra`, which round-trip unchanged.
//!
//! Known fields are typed strictly: a stored value of the wrong JSON type
//! (say `"commission_rate": "12%"`) makes the typed read fail with
//! `EntityError::Serialization`. The untyped `EntityAccess` handle reads
//! such documents as-is.
//!
//! Serializing one of these structs only emits the fields that are set,
//! which makes the same type usable as a partial update patch:
//!
//! ```rust
//! use studyhub_core::models::Agent;
//!
//! let patch = Agent {
//!     payout_status: Some("approved".to_string()),
//!     ..Default::default()
//! };
//! let value = serde_json::to_value(&patch).unwrap();
//! assert_eq!(value, serde_json::json!({"payout_status": "approved"}));
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::Fields;

/// A domain type stored in one collection
///
/// `NAME` is the domain name used as the key into the entity table
/// (`"Agent"`), not the collection name (`"agents"`).
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const NAME: &'static str;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for Student {
    const NAME: &'static str = "Student";
}

/// Education agent recruiting students on commission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for Agent {
    const NAME: &'static str = "Agent";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct School {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for School {
    const NAME: &'static str = "School";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tutor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for Tutor {
    const NAME: &'static str = "Tutor";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for Vendor {
    const NAME: &'static str = "Vendor";
}

/// Service offered by a vendor on the marketplace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceListing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for MarketplaceListing {
    const NAME: &'static str = "MarketplaceListing";
}

/// Student booking of a marketplace listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for Booking {
    const NAME: &'static str = "Booking";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisaCase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visa_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for VisaCase {
    const NAME: &'static str = "VisaCase";
}

/// Fair, webinar or info session
///
/// `event_id` is the externally shared business identifier; links in the
/// wild carry either it or the raw document id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for Event {
    const NAME: &'static str = "Event";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRegistration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for EventRegistration {
    const NAME: &'static str = "EventRegistration";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TutoringSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for TutoringSession {
    const NAME: &'static str = "TutoringSession";
}

/// Payment awaiting manual verification (proof of transfer uploaded)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for Payment {
    const NAME: &'static str = "Payment";
}

/// Keyed application setting (logically one record per key)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSetting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl Entity for AppSetting {
    const NAME: &'static str = "AppSetting";
}
