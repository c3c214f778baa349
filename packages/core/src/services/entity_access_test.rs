//! Tests for the generic entity factory
//!
//! Tests cover:
//! - Natural-key routing in `filter` vs. plain equality queries
//! - Explicit `lookup` sharing the same policy
//! - Write decorators applied on create/update with a fixed clock
//! - Typed `EntityStore<T>` round trips
//! - Sorted, capped listings

#[cfg(test)]
mod tests {
    use crate::db::MemoryDriver;
    use crate::models::{
        Agent, Entity, Event, EventRegistration, Fields, FilterOptions, Payment, Predicate,
        SortSpec,
    };
    use crate::services::{
        EntityDefinition, EntityError, EntityRegistry, FixedClock, LookupPolicy,
    };
    use chrono::{TimeZone, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};
    use std::sync::Arc;

    const NOW: &str = "2024-05-01T09:30:00.000Z";

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn setup() -> (EntityRegistry, Arc<MemoryDriver>) {
        let driver = Arc::new(MemoryDriver::new());
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
        let registry = EntityRegistry::new(driver.clone()).with_clock(Arc::new(clock));
        (registry, driver)
    }

    async fn seed_events(driver: &MemoryDriver) {
        driver
            .insert_with_id(
                "events",
                "doc-1",
                fields(json!({"event_id": "evt-42", "title": "Open Day"})),
            )
            .await;
        driver
            .insert_with_id(
                "events",
                "doc-2",
                fields(json!({"event_id": "evt-7", "title": "Visa Webinar"})),
            )
            .await;
    }

    #[tokio::test]
    async fn test_filter_on_natural_key_uses_policy() {
        let (registry, driver) = setup();
        seed_events(&driver).await;
        let events = registry.entity("Event").unwrap();

        // Id fallback only happens through the policy path
        let found = events
            .filter(&Predicate::new().eq("event_id", "doc-2"), &FilterOptions::new())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("event_id"), Some("evt-7"));
    }

    #[tokio::test]
    async fn test_filter_with_extra_constraint_skips_fallback() {
        let (registry, driver) = setup();
        seed_events(&driver).await;
        let events = registry.entity("Event").unwrap();

        let predicate = Predicate::new()
            .eq("event_id", "doc-2")
            .eq("title", "Visa Webinar");
        let found = events.filter(&predicate, &FilterOptions::new()).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_null_constraint_does_not_block_natural_key() {
        let (registry, driver) = setup();
        seed_events(&driver).await;
        let events = registry.entity("Event").unwrap();

        let predicate = Predicate::new()
            .eq("event_id", "doc-1")
            .eq("title", Value::Null);
        let found = events.filter(&predicate, &FilterOptions::new()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "doc-1");
    }

    #[tokio::test]
    async fn test_plain_entity_never_falls_back() {
        let (registry, driver) = setup();
        driver
            .insert_with_id("agents", "a1", fields(json!({"company_name": "Acme"})))
            .await;
        let agents = registry.entity("Agent").unwrap();

        let found = agents
            .filter(&Predicate::new().eq("company_name", "a1"), &FilterOptions::new())
            .await
            .unwrap();
        assert!(found.is_empty());

        // Explicit lookup on a plain entity is an id lookup
        let found = agents.lookup("a1").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_matches_filter() {
        let (registry, driver) = setup();
        seed_events(&driver).await;
        let events = registry.entity("Event").unwrap();

        for value in ["evt-42", "doc-1", "missing"] {
            let via_filter = events
                .filter(&Predicate::new().eq("event_id", value), &FilterOptions::new())
                .await
                .unwrap();
            let via_lookup = events.lookup(value).await.unwrap();
            assert_eq!(via_filter, via_lookup, "value {}", value);
        }
    }

    #[tokio::test]
    async fn test_registration_create_is_stamped() {
        let (registry, _) = setup();
        let registrations = registry.store::<EventRegistration>().unwrap();

        let created = registrations
            .create(&EventRegistration {
                event_id: Some("evt-42".to_string()),
                email: Some("ana@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(created.data.status.as_deref(), Some("pending"));
        assert_eq!(created.data.created_date.as_deref(), Some(NOW));
        assert_eq!(created.data.updated_date.as_deref(), Some(NOW));
        assert_eq!(created.data.email.as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn test_payment_update_is_stamped_and_caller_status_wins() {
        let (registry, driver) = setup();
        driver
            .insert_with_id(
                "payments",
                "p1",
                fields(json!({
                    "amount": 250.0,
                    "status": "pending",
                    "created_date": "2024-01-01T00:00:00.000Z",
                    "updated_date": "2024-01-01T00:00:00.000Z",
                })),
            )
            .await;
        let payments = registry.store::<Payment>().unwrap();

        let updated = payments
            .update(
                "p1",
                &Payment {
                    status: Some("verified".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.data.status.as_deref(), Some("verified"));
        assert_eq!(updated.data.amount, Some(250.0));
        assert_eq!(
            updated.data.created_date.as_deref(),
            Some("2024-01-01T00:00:00.000Z")
        );
        assert_eq!(updated.data.updated_date.as_deref(), Some(NOW));
    }

    #[tokio::test]
    async fn test_undecorated_entity_is_stored_verbatim() {
        let (registry, _) = setup();
        let agents = registry.entity("Agent").unwrap();

        let created = agents
            .create(fields(json!({"company_name": "Acme"})))
            .await
            .unwrap();
        assert_eq!(created.fields, fields(json!({"company_name": "Acme"})));
    }

    #[tokio::test]
    async fn test_typed_round_trip_keeps_unknown_fields() {
        let (registry, driver) = setup();
        driver
            .insert_with_id(
                "agents",
                "a1",
                fields(json!({"company_name": "Acme", "referral_code": "ACME10"})),
            )
            .await;
        let agents = registry.store::<Agent>().unwrap();

        let agent = agents.get("a1").await.unwrap().unwrap();
        assert_eq!(agent.id, "a1");
        assert_eq!(agent.data.company_name.as_deref(), Some("Acme"));
        assert_eq!(agent.data.extra["referral_code"], "ACME10");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (registry, _) = setup();
        let agents = registry.store::<Agent>().unwrap();

        let err = agents
            .update("ghost", &Agent::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_sorts_and_limits() {
        let (registry, driver) = setup();
        for (id, title, date) in [
            ("e1", "B", "2024-03-01"),
            ("e2", "A", "2024-01-01"),
            ("e3", "C", "2024-02-01"),
        ] {
            driver
                .insert_with_id(
                    "events",
                    id,
                    fields(json!({"title": title, "start_date": date})),
                )
                .await;
        }
        let events = registry.store::<Event>().unwrap();

        let newest = events
            .list(SortSpec::parse("-start_date"), Some(2))
            .await
            .unwrap();
        let ids: Vec<_> = newest.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e3"]);

        let all = events.list(None, None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Tag(String);

    impl Entity for Tag {
        const NAME: &'static str = "Tag";
    }

    #[tokio::test]
    async fn test_non_object_payload_is_rejected() {
        let (mut registry, driver) = setup();
        registry.register(
            EntityDefinition::new("Tag", "tags").with_lookup(LookupPolicy::IdOnly { field: "tag" }),
        );
        let tags = registry.store::<Tag>().unwrap();

        let err = tags.create(&Tag("visa".to_string())).await.unwrap_err();
        assert!(matches!(err, EntityError::InvalidPayload(_)));
        assert_eq!(driver.metrics().snapshot().inserts, 0);
    }
}
