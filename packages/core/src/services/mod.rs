//! Entity Services
//!
//! This module contains the entity access layer built on the CRUD
//! primitives:
//!
//! - `EntityAccess` / `EntityStore<T>` - Uniform CRUD handles per entity
//! - `LookupPolicy` - Natural-key resolution shared by `filter` and `lookup`
//! - `WriteDecorator` / `StampDefaults` - Payload rewriting before writes
//! - `EntityRegistry` - Handles built from the constant `ENTITY_TABLE`
//! - `SettingsStore` - Keyed singleton settings
//!
//! Services hold no state of their own beyond configuration; every call
//! round trips to the driver.

pub mod clock;
mod decorators;
mod entity_access;
pub mod error;
mod lookup;
pub mod registry;
mod settings;

pub use clock::{Clock, FixedClock, SystemClock};
pub use decorators::{StampDefaults, WriteDecorator};
pub use entity_access::{EntityAccess, EntityDefinition, EntityStore};
pub use error::{EntityError, EntityResult};
pub use lookup::LookupPolicy;
pub use registry::{EntityRegistry, ENTITY_TABLE};
pub use settings::SettingsStore;
