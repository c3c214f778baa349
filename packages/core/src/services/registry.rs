//! Entity Registry
//!
//! Domain names map to collections through `ENTITY_TABLE`, a constant table
//! that also attaches each entity's lookup policy and write decorator.
//! `EntityRegistry` hands out handles built from that table: untyped
//! `EntityAccess` by name for dynamic callers, and typed `EntityStore<T>`
//! keyed by `Entity::NAME`.

use std::fmt;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::decorators::StampDefaults;
use super::entity_access::{EntityAccess, EntityDefinition, EntityStore};
use super::error::{EntityError, EntityResult};
use super::lookup::LookupPolicy;
use super::settings::SettingsStore;
use crate::db::{DocumentDriver, DocumentStore};
use crate::models::{AppSetting, Entity};

/// Defaults stamped onto event registrations
pub static REGISTRATION_DEFAULTS: StampDefaults = StampDefaults::new().with_status("pending");

/// Defaults stamped onto payments awaiting verification
pub static PAYMENT_DEFAULTS: StampDefaults = StampDefaults::new().with_status("pending");

/// Domain name → collection, lookup policy and decorator
pub static ENTITY_TABLE: &[EntityDefinition] = &[
    EntityDefinition::new("Student", "students"),
    EntityDefinition::new("Agent", "agents"),
    EntityDefinition::new("School", "schools"),
    EntityDefinition::new("Tutor", "tutors"),
    EntityDefinition::new("Vendor", "vendors"),
    EntityDefinition::new("MarketplaceListing", "marketplace_listings"),
    EntityDefinition::new("Booking", "bookings"),
    EntityDefinition::new("VisaCase", "visa_cases"),
    EntityDefinition::new("Event", "events")
        .with_lookup(LookupPolicy::NaturalKeyThenId { field: "event_id" }),
    EntityDefinition::new("EventRegistration", "event_registrations")
        .with_decorator(&REGISTRATION_DEFAULTS),
    EntityDefinition::new("TutoringSession", "tutoring_sessions"),
    EntityDefinition::new("Payment", "payments").with_decorator(&PAYMENT_DEFAULTS),
    EntityDefinition::new("AppSetting", "app_settings").with_lookup(LookupPolicy::NaturalKeyOnly {
        field: "key",
        singleton: true,
    }),
];

/// Registry of entity handles sharing one driver and clock
#[derive(Clone)]
pub struct EntityRegistry {
    store: DocumentStore,
    clock: Arc<dyn Clock>,
    definitions: Vec<EntityDefinition>,
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("clock", &self.clock)
            .field(
                "entities",
                &self.definitions.iter().map(|d| d.name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl EntityRegistry {
    /// Registry over `ENTITY_TABLE` using the wall clock
    pub fn new(driver: Arc<dyn DocumentDriver>) -> Self {
        Self::from_store(DocumentStore::new(driver))
    }

    pub fn from_store(store: DocumentStore) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            definitions: ENTITY_TABLE.to_vec(),
        }
    }

    /// Replace the clock used for stamped fields
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Add a definition, replacing any existing one with the same name
    pub fn register(&mut self, definition: EntityDefinition) {
        match self
            .definitions
            .iter_mut()
            .find(|existing| existing.name == definition.name)
        {
            Some(existing) => {
                tracing::debug!(entity = definition.name, "Replacing entity definition");
                *existing = definition;
            }
            None => self.definitions.push(definition),
        }
    }

    pub fn definition(&self, name: &str) -> Option<&EntityDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &EntityDefinition> {
        self.definitions.iter()
    }

    /// The CRUD primitives every handle is built on
    pub fn documents(&self) -> &DocumentStore {
        &self.store
    }

    /// Untyped handle by domain name
    pub fn entity(&self, name: &str) -> EntityResult<EntityAccess> {
        let definition = self
            .definition(name)
            .copied()
            .ok_or_else(|| EntityError::unknown_entity(name))?;
        Ok(EntityAccess::new(
            definition,
            self.store.clone(),
            self.clock.clone(),
        ))
    }

    /// Typed handle for `T`
    pub fn store<T: Entity>(&self) -> EntityResult<EntityStore<T>> {
        Ok(EntityStore::new(self.entity(T::NAME)?))
    }

    /// Keyed settings over the `AppSetting` entity
    pub fn settings(&self) -> EntityResult<SettingsStore> {
        Ok(SettingsStore::new(self.store::<AppSetting>()?))
    }
}
