use resource_sample::error::UserError;
use resource_sample::lifecycle::{DirectoryConfig, UserDirectory};
use resource_sample::model::{UserCreate, UserId, UserUpdate};
use resource_service::ServiceClient;

fn params(name: &str, email: &str) -> UserCreate {
    UserCreate {
        name: name.to_string(),
        email: email.to_string(),
    }
}

/// Full end-to-end test against the in-process backend.
#[tokio::test]
async fn test_full_user_lifecycle() {
    let directory = UserDirectory::start(&DirectoryConfig::default());
    let users = directory.user_client.clone();

    // Register
    let alice = users
        .register(params("Alice", "alice@example.com"))
        .await
        .expect("Failed to register user");
    assert_eq!(alice.id, Some(UserId(1)));

    let bob = users
        .register(params("Bob", "bob@example.com"))
        .await
        .expect("Failed to register user");
    assert_eq!(bob.id, Some(UserId(2)));

    // Query
    let everyone = users.query().await.expect("Failed to list users");
    assert_eq!(everyone, vec![alice.clone(), bob.clone()]);

    // Update
    let renamed = users
        .update_user(
            UserId(1),
            UserUpdate {
                name: None,
                email: Some("alice@wonderland.example".to_string()),
            },
        )
        .await
        .expect("Failed to update user");
    assert_eq!(renamed.email, "alice@wonderland.example");
    assert_eq!(
        users.get(UserId(1)).await.expect("Failed to get user"),
        renamed
    );

    // Remove, then get is rejected
    users.remove(UserId(2)).await.expect("Failed to remove user");
    assert_eq!(
        users.get(UserId(2)).await,
        Err(UserError::NotFound("2".to_string()))
    );
    assert_eq!(
        users.remove(UserId(2)).await,
        Err(UserError::NotFound("2".to_string()))
    );

    drop(users);
    directory.shutdown().await.expect("Shutdown failed");
}

#[tokio::test]
async fn test_invalid_registration_is_rejected() {
    let directory = UserDirectory::start(&DirectoryConfig::default());

    let result = directory
        .user_client
        .register(params("", "nobody@example.com"))
        .await;
    assert!(matches!(result, Err(UserError::ValidationError(_))));

    let everyone = directory.user_client.query().await.unwrap();
    assert!(everyone.is_empty());

    directory.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_registrations_with_latency() {
    let config = DirectoryConfig {
        latency_ms: 20,
        ..DirectoryConfig::default()
    };
    let directory = UserDirectory::start(&config);
    let users = &directory.user_client;

    let (a, b, c) = tokio::join!(
        users.register(params("A", "a@example.com")),
        users.register(params("B", "b@example.com")),
        users.register(params("C", "c@example.com")),
    );

    let mut ids: Vec<u64> = [a, b, c]
        .into_iter()
        .map(|r| r.unwrap().id.unwrap().0)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(users.query().await.unwrap().len(), 3);

    directory.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_update_of_missing_user_is_not_found() {
    let directory = UserDirectory::start(&DirectoryConfig::default());

    let result = directory
        .user_client
        .update_user(UserId(42), UserUpdate::default())
        .await;
    assert_eq!(result, Err(UserError::NotFound("42".to_string())));

    directory.shutdown().await.unwrap();
}
