//! # Resource Sample
//!
//! Walks the User resource through its whole lifecycle against an in-process backend:
//! register, list, fetch, update, remove, then fetch again and observe the rejection.
//!
//! ```bash
//! RUST_LOG=info cargo run -p resource-sample
//! RESOURCE_LATENCY_MS=50 RUST_LOG=debug cargo run -p resource-sample
//! ```

use resource_sample::lifecycle::{setup_tracing, DirectoryConfig, UserDirectory};
use resource_sample::model::{UserCreate, UserUpdate};
use resource_service::ServiceClient;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = DirectoryConfig::from_env().map_err(|e| e.to_string())?;
    info!(?config, "Starting user directory");
    let directory = UserDirectory::start(&config);
    let users = &directory.user_client;

    let span = tracing::info_span!("registration");
    let (alice, bob) = async {
        let alice = users.register(UserCreate {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        });
        let bob = users.register(UserCreate {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
        });
        // Independent operations; they settle in whatever order the backend answers.
        tokio::try_join!(alice, bob).map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;
    info!(alice = ?alice.id, bob = ?bob.id, "Users registered");

    let everyone = users.query().await.map_err(|e| e.to_string())?;
    info!(count = everyone.len(), "Listed users");

    let alice_id = alice.id.ok_or("registered user has no id")?;
    let renamed = users
        .update_user(
            alice_id,
            UserUpdate {
                name: Some("Alice Liddell".to_string()),
                email: None,
            },
        )
        .instrument(tracing::info_span!("rename"))
        .await
        .map_err(|e| e.to_string())?;
    info!(name = %renamed.name, "User renamed");

    if let Some(last) = users.last_seen().record() {
        info!(name = %last.value.name, age_ms = last.age().as_millis() as u64, "Last seen user");
    }

    let bob_id = bob.id.ok_or("registered user has no id")?;
    users.remove(bob_id).await.map_err(|e| e.to_string())?;
    match users.get(bob_id).await {
        Ok(user) => error!(?user, "Removed user is still present"),
        Err(e) => info!(error = %e, "Removed user is gone"),
    }

    directory.shutdown().await?;

    info!("Sample completed successfully");
    Ok(())
}
