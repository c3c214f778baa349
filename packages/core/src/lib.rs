//! StudyHub Core Data Access Layer
//!
//! This crate provides the generic entity-access layer the StudyHub pages
//! are built on: named collections mapped to uniform CRUD handles over a
//! document database, plus current-session resolution against an auth
//! provider.
//!
//! # Architecture
//!
//! - **Schema-agnostic documents**: every record is an open JSON object plus
//!   a driver-assigned `id`
//! - **Equality-only queries**: filters are AND-combined exact matches, so
//!   no composite indexes are required in the backing store
//! - **Table-driven entities**: domain names, collections, lookup policies
//!   and write decorators live in one constant table
//! - **No caches**: every call round trips to the driver
//!
//! # Modules
//!
//! - [`models`] - Documents, predicates and typed domain entities
//! - [`db`] - Driver contract, CRUD primitives, memory and SurrealDB drivers
//! - [`services`] - Entity handles, lookup policies, decorators, registry
//! - [`auth`] - Auth provider contract and session resolution
//! - [`config`] - Runtime configuration
//! - [`logging`] - Tracing subscriber setup for binaries and tests

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use auth::{AuthError, AuthProvider, SessionService, SessionUser};
pub use config::{ConfigError, CoreConfig};
pub use db::{DatabaseError, DocumentDriver, DocumentStore, MemoryDriver};
pub use models::*;
pub use services::*;
