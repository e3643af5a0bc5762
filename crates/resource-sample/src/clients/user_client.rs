//! # User Client
//!
//! Provides a high-level API for the `User` resource. It wraps a `RequestService<User>`,
//! maps service errors into [`UserError`], and adds the domain-specific write paths.
use crate::error::UserError;
use crate::model::{User, UserCreate, UserId, UserUpdate};
use async_trait::async_trait;
use resource_service::{RequestService, ServiceClient, ServiceError, Snapshot};
use tracing::{debug, instrument};

/// Client for the remote User collection.
#[derive(Clone)]
pub struct UserClient {
    inner: RequestService<User>,
}

impl UserClient {
    pub fn new(inner: RequestService<User>) -> Self {
        Self { inner }
    }

    /// Last users this client saw. May be stale; see [`Snapshot`].
    pub fn last_seen(&self) -> &Snapshot<User> {
        self.inner.snapshot()
    }
}

#[async_trait]
impl ServiceClient<User> for UserClient {
    type Error = UserError;

    fn inner(&self) -> &RequestService<User> {
        &self.inner
    }

    fn map_error(e: ServiceError) -> Self::Error {
        UserError::from(e)
    }
}

impl UserClient {
    /// Registers a new user and returns it with its assigned id.
    #[instrument(skip(self))]
    pub async fn register(&self, params: UserCreate) -> Result<User, UserError> {
        debug!("Sending request");
        let draft = User::from(params);
        self.inner.save(&draft).await.map_err(UserError::from)
    }

    /// Fetches a user, applies `update`, and writes it back.
    #[instrument(skip(self))]
    pub async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, UserError> {
        debug!("Sending request");
        let mut user = self.inner.get(&id).await.map_err(UserError::from)?;
        user.apply(update);
        self.inner.update(&user).await.map_err(UserError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_service::mock::MockTransport;
    use resource_service::ResourcePath;
    use serde_json::json;

    fn client(mock: &MockTransport) -> UserClient {
        UserClient::new(RequestService::new(
            mock.clone(),
            ResourcePath::new("/api/users/:id"),
        ))
    }

    #[tokio::test]
    async fn register_returns_assigned_id() {
        let mock = MockTransport::new();
        mock.expect_post("/api/users").return_json(
            201,
            &json!({"id": 1, "name": "Alice", "email": "alice@example.com"}),
        );

        let user = client(&mock)
            .register(UserCreate {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.id, Some(UserId(1)));
        mock.verify();
    }

    #[tokio::test]
    async fn register_rejects_invalid_email_locally() {
        let mock = MockTransport::new();

        let result = client(&mock)
            .register(UserCreate {
                name: "Alice".to_string(),
                email: "not-an-email".to_string(),
            })
            .await;

        assert!(matches!(result, Err(UserError::ValidationError(_))));
        assert!(mock.received().is_empty());
    }

    #[tokio::test]
    async fn update_user_reads_then_writes() {
        let mock = MockTransport::new();
        mock.expect_get("/api/users/2")
            .return_json(200, &json!({"id": 2, "name": "Bob", "email": "bob@example.com"}));
        mock.expect_put("/api/users/2")
            .return_json(200, &json!({"id": 2, "name": "Robert", "email": "bob@example.com"}));

        let update = UserUpdate {
            name: Some("Robert".to_string()),
            email: None,
        };
        let user = client(&mock).update_user(UserId(2), update).await.unwrap();

        assert_eq!(user.name, "Robert");
        let put = &mock.received()[1];
        let body: serde_json::Value = serde_json::from_slice(put.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["name"], "Robert");
        mock.verify();
    }

    #[tokio::test]
    async fn missing_user_maps_to_not_found() {
        let mock = MockTransport::new();
        mock.expect_get("/api/users/7").return_status(404);

        let result = client(&mock).get(UserId(7)).await;

        assert_eq!(result, Err(UserError::NotFound("7".to_string())));
        mock.verify();
    }
}
