//! # RemoteEntity Trait
//!
//! The contract a record type must satisfy to be served by a
//! [`RequestService`](crate::RequestService). It is the remote counterpart of a plain
//! domain struct: it travels as JSON, and its identifier is assigned by the server.
//!
//! A record without an identifier is a draft (valid input to `save`); a record with one is
//! persisted (valid input to `update`).

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};

/// Trait that any record type must implement to be managed by a `RequestService`.
pub trait RemoteEntity: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Server-assigned identifier. Its `Display` form is used as the URL path segment.
    type Id: Clone + PartialEq + Display + Debug + Send + Sync + 'static;

    /// The identifier, or `None` if the record has not been persisted yet.
    fn id(&self) -> Option<&Self::Id>;

    /// Local checks run before `save` and `update` issue a transport call.
    ///
    /// The default accepts everything.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}
