//! Data Models
//!
//! This module contains the data structures the access layer works with:
//!
//! - `Document` - An addressed, schema-less record (fields + `id`)
//! - `Predicate`, `SortSpec`, `FilterOptions` - Equality-only query inputs
//! - Domain entities (`Agent`, `Event`, `Payment`, ...) - Typed, lenient views
//!   over documents, keyed into the entity table by their `Entity::NAME`

mod document;
mod entities;
mod query;

pub use document::{
    coerce_id, to_fields, Document, DocumentKey, Fields, Record, RemovedDocument, ID_FIELD,
};
pub use entities::{
    Agent, AppSetting, Booking, Entity, Event, EventRegistration, MarketplaceListing, Payment,
    School, Student, Tutor, TutoringSession, Vendor, VisaCase,
};
pub use query::{FilterOptions, Predicate, SortDirection, SortSpec};
