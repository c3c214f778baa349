//! Keyed Singleton Settings
//!
//! Application settings are stored as `{key, value}` documents. Storage
//! does not enforce one document per key, so reads are capped at a single
//! result and writes update the first match instead of adding another.

use serde_json::Value;

use super::entity_access::EntityStore;
use super::error::EntityResult;
use crate::models::{AppSetting, Fields, FilterOptions, Predicate, Record};

/// Settings view over the `AppSetting` entity
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings: EntityStore<AppSetting>,
}

impl SettingsStore {
    pub fn new(settings: EntityStore<AppSetting>) -> Self {
        Self { settings }
    }

    /// The setting stored under `key`, if any
    ///
    /// Returns at most one record even if several documents share the key.
    pub async fn get(&self, key: &str) -> EntityResult<Option<Record<AppSetting>>> {
        let predicate = Predicate::new().eq("key", key);
        let options = FilterOptions::new().with_limit(1);
        Ok(self
            .settings
            .filter(&predicate, &options)
            .await?
            .into_iter()
            .next())
    }

    /// Just the stored value under `key`
    pub async fn value(&self, key: &str) -> EntityResult<Option<Value>> {
        Ok(self.get(key).await?.and_then(|record| record.data.value))
    }

    /// Store `value` under `key`, updating the existing record if there is one
    pub async fn set(
        &self,
        key: &str,
        value: impl Into<Value>,
    ) -> EntityResult<Record<AppSetting>> {
        let value = value.into();
        match self.get(key).await? {
            Some(existing) => {
                tracing::debug!(key, id = %existing.id, "Updating setting");
                let mut patch = Fields::new();
                patch.insert("value".to_string(), value);
                self.settings.update_fields(&existing.id, patch).await
            }
            None => {
                tracing::debug!(key, "Creating setting");
                self.settings
                    .create(&AppSetting {
                        key: Some(key.to_string()),
                        value: Some(value),
                        ..Default::default()
                    })
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDriver;
    use crate::services::EntityRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn into_fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn setup() -> (SettingsStore, Arc<MemoryDriver>) {
        let driver = Arc::new(MemoryDriver::new());
        let settings = EntityRegistry::new(driver.clone()).settings().unwrap();
        (settings, driver)
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let (settings, _) = setup();
        assert!(settings.get("theme").await.unwrap().is_none());
        assert!(settings.value("theme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicates_return_one_record() {
        let (settings, driver) = setup();
        for (id, value) in [("s1", "dark"), ("s2", "light")] {
            driver
                .insert_with_id(
                    "app_settings",
                    id,
                    into_fields(json!({"key": "theme", "value": value})),
                )
                .await;
        }

        let record = settings.get("theme").await.unwrap().unwrap();
        assert_eq!(record.id, "s1");
        assert_eq!(record.data.value, Some(json!("dark")));
    }

    #[tokio::test]
    async fn test_set_upserts() {
        let (settings, driver) = setup();

        let created = settings.set("support_email", "help@studyhub.io").await.unwrap();
        let updated = settings.set("support_email", "team@studyhub.io").await.unwrap();

        assert_eq!(created.id, updated.id);
        assert_eq!(driver.len("app_settings").await, 1);
        assert_eq!(
            settings.value("support_email").await.unwrap(),
            Some(json!("team@studyhub.io"))
        );
    }

    #[tokio::test]
    async fn test_structured_values() {
        let (settings, _) = setup();
        settings
            .set("commission", json!({"default_rate": 0.12, "tiers": [5, 10]}))
            .await
            .unwrap();

        let value = settings.value("commission").await.unwrap().unwrap();
        assert_eq!(value["tiers"], json!([5, 10]));
    }
}
