//! # ServiceClient Trait
//!
//! Provides a common interface for resource-specific clients, adding default `query`, `get`
//! and `remove` methods built on top of a generic [`RequestService`].
use crate::{RemoteEntity, RequestService, ServiceError};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit the read and delete operations.
///
/// Implementors supply the wrapped service and an error mapping; the awaited versions of
/// the common operations come for free. Operations that need domain-specific payload
/// handling (`save`, `update`) stay on the concrete client.
///
/// # Example
///
/// ```rust
/// use resource_service::{RemoteEntity, RequestService, ServiceClient, ServiceError};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// struct Tag { id: Option<u32>, label: String }
/// impl RemoteEntity for Tag {
///     type Id = u32;
///     fn id(&self) -> Option<&u32> { self.id.as_ref() }
/// }
///
/// #[derive(Debug)]
/// struct TagError(String);
///
/// struct TagClient { inner: RequestService<Tag> }
///
/// impl ServiceClient<Tag> for TagClient {
///     type Error = TagError;
///     fn inner(&self) -> &RequestService<Tag> { &self.inner }
///     fn map_error(e: ServiceError) -> TagError { TagError(e.to_string()) }
/// }
///
/// async fn usage(client: TagClient) {
///     // query(), get() and remove() are provided automatically!
///     let _ = client.query().await;
///     let _ = client.get(1).await;
///     let _ = client.remove(1).await;
/// }
/// ```
#[async_trait]
pub trait ServiceClient<T: RemoteEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: Send;

    /// Access the inner generic RequestService.
    fn inner(&self) -> &RequestService<T>;

    /// Map service errors to the resource-specific error type.
    fn map_error(e: ServiceError) -> Self::Error;

    /// Fetch the whole collection.
    #[tracing::instrument(skip(self))]
    async fn query(&self) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().query().await.map_err(Self::map_error)
    }

    /// Fetch one record by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<T, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(&id).await.map_err(Self::map_error)
    }

    /// Delete a record by ID.
    #[tracing::instrument(skip(self))]
    async fn remove(&self, id: T::Id) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().remove(&id).await.map_err(Self::map_error)
    }
}
