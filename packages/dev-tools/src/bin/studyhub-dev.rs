//! Development Seeder for the StudyHub Entity Layer
//!
//! Standalone binary that wires configuration, logging and a document
//! driver together, seeds a small demo dataset through the entity registry
//! and prints what the lookup paths return.
//!
//! Seeds:
//!   - one agent (then approves its payout)
//!   - one event with `event_id = "evt-demo"`
//!   - one registration for that event (stamped with status/timestamps)
//!   - the `support_email` setting
//!
//! # Usage
//!
//! ```bash
//! # In-memory (default)
//! cargo run --bin studyhub-dev
//!
//! # Embedded SurrealDB on disk
//! STUDYHUB_DB_BACKEND=surreal STUDYHUB_DB_PATH=./data/dev.db \
//!     cargo run --bin studyhub-dev --features surrealdb
//! ```
//!
//! Log level follows `RUST_LOG`, defaulting to debug for this tool and the
//! core crate.

use serde_json::{json, Value};
use studyhub_core::config::CoreConfig;
use studyhub_core::db;
use studyhub_core::logging::init_tracing;
use studyhub_core::models::{Event, EventRegistration, Fields, FilterOptions, Predicate};
use studyhub_core::services::EntityRegistry;

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

fn print_json(label: &str, value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}:\n{}\n", label, serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_tracing("studyhub_dev=debug,studyhub_core=debug");

    println!("🔧 Initializing studyhub-dev...");

    let config = CoreConfig::from_env()?;
    tracing::info!(backend = ?config.backend, "Loaded configuration");

    println!("📡 Connecting document driver...");
    let driver = match db::connect(&config).await {
        Ok(driver) => {
            println!("✅ Connected");
            driver
        }
        Err(e) => {
            eprintln!("❌ Failed to open document driver: {}", e);
            eprintln!("   SurrealDB backends need: --features surrealdb");
            return Err(e.into());
        }
    };

    let registry = EntityRegistry::new(driver);

    // Agent: create, then partial update
    let agents = registry.entity("Agent")?;
    let agent = agents
        .create(fields(json!({"company_name": "Acme Education", "country": "VN"})))
        .await?;
    let agent = agents
        .update(&agent.id, fields(json!({"payout_status": "approved"})))
        .await?;
    print_json("Agent", &agent)?;

    // Event with a natural key
    let events = registry.store::<Event>()?;
    let event = events
        .create(&Event {
            event_id: Some("evt-demo".to_string()),
            title: Some("Study in Australia Fair".to_string()),
            location: Some("Ho Chi Minh City".to_string()),
            ..Default::default()
        })
        .await?;

    let by_key = events
        .filter(&Predicate::new().eq("event_id", "evt-demo"), &FilterOptions::new())
        .await?;
    let by_id = events.lookup(event.id.as_str()).await?;
    print_json("Event lookup by event_id", &by_key)?;
    print_json("Event lookup by document id", &by_id)?;

    // Registration picks up default status and timestamps
    let registration = registry
        .store::<EventRegistration>()?
        .create(&EventRegistration {
            event_id: event.data.event_id.clone(),
            email: Some("student@example.com".to_string()),
            ..Default::default()
        })
        .await?;
    print_json("Registration", &registration)?;

    let settings = registry.settings()?;
    settings.set("support_email", "help@studyhub.io").await?;
    print_json("Setting support_email", &settings.get("support_email").await?)?;

    println!("✅ Done");
    Ok(())
}
