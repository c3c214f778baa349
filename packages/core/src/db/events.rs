//! Store Change Events
//!
//! Events emitted by drivers that support a change feed, after each
//! successful write. Subscribers (live views, test harnesses) receive them
//! over a tokio broadcast channel without coupling to the driver.
//!
//! # Event Flow
//!
//! 1. Driver performs a write (insert, update, delete)
//! 2. Event is emitted via broadcast channel
//! 3. All subscribers receive the event asynchronously

use crate::models::Fields;

/// Change notification for one document
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A new document was inserted
    Created {
        collection: String,
        id: String,
        fields: Fields,
    },

    /// An existing document was merged with a patch (fields are the result)
    Updated {
        collection: String,
        id: String,
        fields: Fields,
    },

    /// A document was deleted
    Deleted { collection: String, id: String },
}

impl StoreEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            StoreEvent::Created { .. } => "document:created",
            StoreEvent::Updated { .. } => "document:updated",
            StoreEvent::Deleted { .. } => "document:deleted",
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            StoreEvent::Created { collection, .. }
            | StoreEvent::Updated { collection, .. }
            | StoreEvent::Deleted { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            StoreEvent::Created { id, .. }
            | StoreEvent::Updated { id, .. }
            | StoreEvent::Deleted { id, .. } => id,
        }
    }
}
