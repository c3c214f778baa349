//! Database Layer
//!
//! This module handles every interaction with the external document
//! database:
//!
//! - `DocumentDriver` - the capability set the core consumes from a backend
//! - `DocumentStore` - CRUD primitives built on a driver
//! - `MemoryDriver` - in-process backend (tests, dev tool, default config)
//! - `SurrealDriver` - embedded SurrealDB backend (`surrealdb` feature)
//!
//! # Architecture
//!
//! The core holds no cache and no cross-call state. Every operation round
//! trips to the driver; the driver alone owns connections and consistency.

mod document_store;
mod driver;
mod error;
pub mod events;
mod memory_store;
pub mod metrics;
#[cfg(feature = "surrealdb")]
mod surreal_store;

pub use document_store::DocumentStore;
pub use driver::{DocumentDriver, DocumentQuery, StoredDocument};
pub use error::DatabaseError;
pub use events::StoreEvent;
pub use memory_store::MemoryDriver;
pub use metrics::{DriverMetrics, DriverOperation, MetricsSnapshot};
#[cfg(feature = "surrealdb")]
pub use surreal_store::SurrealDriver;

use std::sync::Arc;

use crate::config::{CoreConfig, StorageBackend};

/// Open the driver selected by `config`
///
/// SurrealDB backends need the `surrealdb` feature; without it they fail
/// with `DatabaseError::Unavailable`.
pub async fn connect(config: &CoreConfig) -> Result<Arc<dyn DocumentDriver>, DatabaseError> {
    match &config.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory document driver");
            Ok(Arc::new(MemoryDriver::new()))
        }
        #[cfg(feature = "surrealdb")]
        StorageBackend::Surreal { path } => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| DatabaseError::unavailable(e.to_string()))?;
            }
            tracing::info!(path = %path.display(), "Opening SurrealDB document driver");
            let driver =
                SurrealDriver::new(path.clone(), &config.namespace, &config.database).await?;
            Ok(Arc::new(driver))
        }
        #[cfg(feature = "surrealdb")]
        StorageBackend::SurrealMemory => {
            let driver = SurrealDriver::new_in_memory(&config.namespace, &config.database).await?;
            Ok(Arc::new(driver))
        }
        #[cfg(not(feature = "surrealdb"))]
        StorageBackend::Surreal { .. } | StorageBackend::SurrealMemory => Err(
            DatabaseError::unavailable("SurrealDB backend requires the `surrealdb` feature"),
        ),
    }
}
