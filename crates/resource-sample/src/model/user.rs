use resource_service::RemoteEntity;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Server-assigned identifier for Users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a registered user.
///
/// # Remote Entity
/// This struct implements [`RemoteEntity`], so it can be managed by a
/// [`RequestService`](resource_service::RequestService). A `User` without an `id` is a
/// draft that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
}

impl User {
    /// Creates an unsaved User.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Applies the fields present in `update`.
    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
    }
}

impl RemoteEntity for User {
    type Id = UserId;

    fn id(&self) -> Option<&UserId> {
        self.id.as_ref()
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if !self.email.contains('@') {
            return Err(format!("invalid email address: {}", self.email));
        }
        Ok(())
    }
}

/// Payload for registering a new user.
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
}

impl From<UserCreate> for User {
    fn from(params: UserCreate) -> Self {
        User::new(params.name, params.email)
    }
}

/// Partial changes to an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}
