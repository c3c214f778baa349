//! SurrealDB Driver Tests
//!
//! Runs the entity-access contract against the embedded SurrealDB driver
//! (RocksDB in a temp dir). Only built with `--features surrealdb`.

#![cfg(feature = "surrealdb")]

#[cfg(test)]
mod surreal_driver_tests {
    use anyhow::Result;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use studyhub_core::db::{DatabaseError, DocumentDriver, SurrealDriver};
    use studyhub_core::models::{Event, Fields, FilterOptions, Predicate, SortSpec};
    use studyhub_core::services::EntityRegistry;
    use tempfile::TempDir;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    /// Helper to create test database
    /// Returns (registry, driver, _temp_dir) - temp_dir must be kept alive for test duration
    async fn create_test_registry() -> Result<(EntityRegistry, Arc<SurrealDriver>, TempDir)> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test.db");
        let driver = Arc::new(SurrealDriver::new(db_path, "studyhub", "test").await?);
        Ok((EntityRegistry::new(driver.clone()), driver, temp_dir))
    }

    #[tokio::test]
    async fn test_crud_round_trip() -> Result<()> {
        let (registry, _driver, _temp_dir) = create_test_registry().await?;
        let agents = registry.entity("Agent")?;

        let created = agents.create(fields(json!({"company_name": "Acme", "x": 0}))).await?;
        assert!(!created.id.is_empty());

        let updated = agents
            .update(&created.id, fields(json!({"x": 1, "payout_status": "approved"})))
            .await?;
        assert_eq!(
            updated.fields,
            fields(json!({"company_name": "Acme", "x": 1, "payout_status": "approved"}))
        );

        assert!(agents.remove(&created.id).await?.existed);
        assert!(!agents.remove(&created.id).await?.existed);
        assert!(agents.get(&created.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() -> Result<()> {
        let (_registry, driver, _temp_dir) = create_test_registry().await?;

        let err = driver
            .update("agents", "ghost", fields(json!({"x": 1})))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_patches_on_different_fields_both_survive() -> Result<()> {
        let (_registry, driver, _temp_dir) = create_test_registry().await?;
        let id = driver
            .insert("agents", fields(json!({"a": 0, "b": 0})))
            .await?;

        let first = {
            let driver = driver.clone();
            let id = id.clone();
            tokio::spawn(async move { driver.update("agents", &id, fields(json!({"a": 1}))).await })
        };
        let second = {
            let driver = driver.clone();
            let id = id.clone();
            tokio::spawn(async move { driver.update("agents", &id, fields(json!({"b": 1}))).await })
        };
        first.await??;
        second.await??;

        let stored = driver.get("agents", &id).await?;
        assert_eq!(stored, Some(fields(json!({"a": 1, "b": 1}))));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_replaces_nested_objects() -> Result<()> {
        let (_registry, driver, _temp_dir) = create_test_registry().await?;
        let id = driver
            .insert(
                "agents",
                fields(json!({"address": {"city": "Hanoi", "zip": "100000"}, "x": 0})),
            )
            .await?;

        driver
            .update("agents", &id, fields(json!({"address": {"city": "Da Nang"}})))
            .await?;

        let stored = driver.get("agents", &id).await?;
        assert_eq!(
            stored,
            Some(fields(json!({"address": {"city": "Da Nang"}, "x": 0})))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_reports_existence() -> Result<()> {
        let (_registry, driver, _temp_dir) = create_test_registry().await?;
        let id = driver.insert("agents", fields(json!({"x": 0}))).await?;

        assert!(driver.delete("agents", &id).await?);
        assert!(!driver.delete("agents", &id).await?);
        assert!(driver.get("agents", &id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_event_lookup_both_paths() -> Result<()> {
        let (registry, _driver, _temp_dir) = create_test_registry().await?;
        let events = registry.store::<Event>()?;

        let seeded = events
            .create(&Event {
                event_id: Some("evt-42".to_string()),
                ..Default::default()
            })
            .await?;

        let by_key = events
            .filter(&Predicate::new().eq("event_id", "evt-42"), &FilterOptions::new())
            .await?;
        let by_id = events
            .filter(
                &Predicate::new().eq("event_id", seeded.id.as_str()),
                &FilterOptions::new(),
            )
            .await?;

        assert_eq!(by_key.len(), 1);
        assert_eq!(by_key, by_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_sorted_limited_listing() -> Result<()> {
        let (registry, _driver, _temp_dir) = create_test_registry().await?;
        let events = registry.entity("Event")?;
        for date in ["2024-03-01", "2024-01-01", "2024-02-01"] {
            events.create(fields(json!({"start_date": date}))).await?;
        }

        let listed = events.list(SortSpec::parse("-start_date"), Some(2)).await?;
        let dates: Vec<_> = listed
            .iter()
            .filter_map(|doc| doc.get_str("start_date"))
            .collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-02-01"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_unsafe_field_names() -> Result<()> {
        let (registry, _driver, _temp_dir) = create_test_registry().await?;
        let agents = registry.entity("Agent")?;

        let err = agents
            .filter(
                &Predicate::new().eq("name; DELETE agents", "x"),
                &FilterOptions::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            studyhub_core::EntityError::Database(DatabaseError::InvalidField { .. })
        ));
        Ok(())
    }
}
