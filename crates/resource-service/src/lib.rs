//! # Resource Service
//!
//! Promise-style CRUD access to a remote resource family.
//!
//! A [`RequestService<T>`] wraps one resource family (say `/api/users/:id`) and exposes five
//! operations: [`query`](RequestService::query), [`get`](RequestService::get),
//! [`save`](RequestService::save), [`update`](RequestService::update) and
//! [`remove`](RequestService::remove). Each one returns a [`PendingOperation`] immediately.
//! The handle is a future that settles exactly once, with the decoded record or a
//! [`ServiceError`].
//!
//! ## Architecture Overview
//!
//! The crate separates concerns into three layers:
//!
//! 1. **Entity Layer** ([`RemoteEntity`]) - your record type and how its identifier is read
//! 2. **Service Layer** ([`RequestService`]) - request building, status mapping, decoding
//! 3. **Transport Layer** ([`Transport`], [`Dispatcher`]) - whatever actually moves bytes
//!
//! The service never retries, times out or deduplicates. One operation call is one
//! transport call, and independent calls settle in whatever order their transport calls
//! finish.
//!
//! ## Exactly-Once Settlement
//!
//! Each operation creates a `tokio::sync::oneshot` channel. The receiving half is the
//! [`PendingOperation`]; the sending half is moved into the completion handler wrapped by
//! a [`Completion`]. A transport that fires its completion twice only reaches the handler
//! the first time, and a transport that drops every completion unfired rejects the
//! operation with [`TransportError::Abandoned`]. No operation stays pending forever.
//!
//! ## The Snapshot
//!
//! Every service carries a [`Snapshot`]: the last record and the last collection it
//! received, stamped with when they arrived. It is a convenience for readers who want
//! recent data without awaiting a new call. It is not authoritative, and the service
//! itself never reads it.
//!
//! ## Testing
//!
//! See the [`mock`] module for a canned-response [`MockTransport`](mock::MockTransport) and
//! a channel-backed dispatcher, and the [`memory`] module for a stateful in-process backend.

pub mod client_trait;
pub mod entity;
pub mod error;
pub mod memory;
pub mod mock;
pub mod operation;
pub mod path;
pub mod service;
pub mod snapshot;
pub mod transport;

// Re-export core types for convenience
pub use client_trait::ServiceClient;
pub use entity::RemoteEntity;
pub use error::{ServiceError, TransportError};
pub use memory::{MemoryDispatcher, MemoryServer};
pub use operation::{OperationKind, OperationState, PendingOperation};
pub use path::ResourcePath;
pub use service::RequestService;
pub use snapshot::{Snapshot, Stamped};
pub use transport::{Completion, Dispatcher, RawResponse, Spawned, Transport, TransportRequest};
