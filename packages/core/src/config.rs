//! Core configuration
//!
//! `CoreConfig` says which document backend to open and how long session
//! resolution may wait on the auth provider. It is built once at startup
//! (usually via `CoreConfig::from_env`) and is immutable afterwards.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_NAMESPACE: &str = "studyhub";
const DEFAULT_DATABASE: &str = "core";
const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable required by the selected backend is not set
    #[error("{var} is required for the {backend} backend")]
    MissingVar { var: &'static str, backend: String },

    /// Variable is set but its value cannot be used
    #[error("Invalid {var} '{value}': {reason}")]
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// Assembled configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create a missing variable error
    pub fn missing_var(var: &'static str, backend: impl Into<String>) -> Self {
        Self::MissingVar {
            var,
            backend: backend.into(),
        }
    }

    /// Create an invalid variable error
    pub fn invalid_var(
        var: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidVar {
            var,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Document backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StorageBackend {
    /// In-process `MemoryDriver`
    Memory,

    /// Embedded SurrealDB on RocksDB at `path`
    Surreal { path: PathBuf },

    /// Embedded SurrealDB on its in-memory engine
    SurrealMemory,
}

/// Runtime configuration for the access layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub backend: StorageBackend,

    /// SurrealDB namespace
    pub namespace: String,

    /// SurrealDB database name
    pub database: String,

    /// Upper bound on waiting for the auth provider's first settled state
    #[serde(with = "duration_millis")]
    pub auth_timeout: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }
}

impl CoreConfig {
    /// Build configuration from `STUDYHUB_*` environment variables
    ///
    /// - `STUDYHUB_DB_BACKEND`: `memory` (default), `surreal`, `surreal-memory`
    /// - `STUDYHUB_DB_PATH`: RocksDB directory (required for `surreal`)
    /// - `STUDYHUB_DB_NAMESPACE` / `STUDYHUB_DB_NAME`: SurrealDB namespace/database
    /// - `STUDYHUB_AUTH_TIMEOUT_MS`: session wait bound in milliseconds
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let backend = lookup("STUDYHUB_DB_BACKEND").unwrap_or_else(|| "memory".to_string());
        config.backend = match backend.trim().to_ascii_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "surreal-memory" => StorageBackend::SurrealMemory,
            "surreal" => {
                let path = lookup("STUDYHUB_DB_PATH")
                    .ok_or_else(|| ConfigError::missing_var("STUDYHUB_DB_PATH", "surreal"))?;
                StorageBackend::Surreal {
                    path: PathBuf::from(path),
                }
            }
            other => {
                return Err(ConfigError::invalid_var(
                    "STUDYHUB_DB_BACKEND",
                    other,
                    "expected memory, surreal or surreal-memory",
                ))
            }
        };

        if let Some(namespace) = lookup("STUDYHUB_DB_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Some(database) = lookup("STUDYHUB_DB_NAME") {
            config.database = database;
        }
        if let Some(timeout) = lookup("STUDYHUB_AUTH_TIMEOUT_MS") {
            let millis = timeout
                .trim()
                .parse::<u64>()
                .map_err(|e| {
                    ConfigError::invalid_var(
                        "STUDYHUB_AUTH_TIMEOUT_MS",
                        timeout.as_str(),
                        e.to_string(),
                    )
                })?;
            config.auth_timeout = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::invalid("namespace cannot be empty"));
        }

        if self.database.is_empty() {
            return Err(ConfigError::invalid("database cannot be empty"));
        }

        if self.auth_timeout.is_zero() {
            return Err(ConfigError::invalid("auth_timeout must be greater than 0"));
        }

        if let StorageBackend::Surreal { path } = &self.backend {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::invalid("database path cannot be empty"));
            }
        }

        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
