//! # Request Service
//!
//! [`RequestService<T>`] exposes `query`, `get`, `save`, `update` and `remove` over one
//! resource family. None of them is an `async fn`: each builds one [`PendingOperation`],
//! issues one transport call with a completion handler attached, and returns the handle
//! straight away. The handler turns the transport's outcome into exactly one fulfilment or
//! rejection.
//!
//! There is no retry, timeout or deduplication. Two identical calls make two transport
//! calls, and independent calls settle in whatever order their transport calls finish.
//!
//! ## Status mapping
//!
//! | Outcome | `query` | `get` | `save` | `update` | `remove` |
//! |---------|---------|-------|--------|----------|----------|
//! | 2xx | `Vec<T>` | `T` | `T` | `T` | `()` |
//! | 404 | Transport | NotFound | Transport | NotFound | NotFound |
//! | 400 / 422 | Transport | Transport | Validation | Validation | Transport |
//! | other / no response | Transport | Transport | Transport | Transport | Transport |
//!
//! ```rust
//! use resource_service::mock::MockTransport;
//! use resource_service::{RemoteEntity, RequestService, ResourcePath};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
//! struct Book { id: Option<String>, title: String }
//!
//! impl RemoteEntity for Book {
//!     type Id = String;
//!     fn id(&self) -> Option<&String> { self.id.as_ref() }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_get("/api/books/1")
//!         .return_json(200, &serde_json::json!({"id": "1", "title": "Dune"}));
//!
//!     let books = RequestService::<Book>::new(mock.clone(), ResourcePath::new("/api/books/:id"));
//!     let book = books.get(&"1".to_string()).await.unwrap();
//!     assert_eq!(book.title, "Dune");
//!     mock.verify();
//! }
//! ```

use crate::entity::RemoteEntity;
use crate::error::{ServiceError, TransportError};
use crate::operation::{OperationKind, PendingOperation};
use crate::path::{validate_id, ResourcePath};
use crate::snapshot::Snapshot;
use crate::transport::{Completion, Dispatcher, RawResponse, Spawned, Transport, TransportRequest};
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Promise-style CRUD wrapper around one resource family.
///
/// Cloning is cheap: clones share the transport and the [`Snapshot`].
pub struct RequestService<T: RemoteEntity> {
    dispatcher: Arc<dyn Dispatcher>,
    path: ResourcePath,
    snapshot: Snapshot<T>,
}

impl<T: RemoteEntity> Clone for RequestService<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            path: self.path.clone(),
            snapshot: self.snapshot.clone(),
        }
    }
}

impl<T: RemoteEntity> RequestService<T> {
    /// Builds a service over an async transport. Requests are driven on spawned tokio tasks.
    pub fn new(transport: impl Transport, path: ResourcePath) -> Self {
        Self::with_dispatcher(Arc::new(Spawned::new(transport)), path)
    }

    /// Builds a service over a callback transport.
    pub fn with_dispatcher(dispatcher: Arc<dyn Dispatcher>, path: ResourcePath) -> Self {
        Self {
            dispatcher,
            path,
            snapshot: Snapshot::new(),
        }
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// Non-authoritative copy of the last record/collection this service received.
    pub fn snapshot(&self) -> &Snapshot<T> {
        &self.snapshot
    }

    /// Fetches the whole collection.
    pub fn query(&self) -> PendingOperation<Vec<T>> {
        let url = self.path.collection_url();
        let snapshot = self.snapshot.clone();
        self.issue(
            OperationKind::Query,
            TransportRequest::new(Method::GET, url.clone()),
            url,
            decode_json::<Vec<T>>,
            move |records| snapshot.store_collection(records.clone()),
        )
    }

    /// Fetches one record by identifier.
    pub fn get(&self, id: &T::Id) -> PendingOperation<T> {
        let id = id.to_string();
        if let Err(e) = validate_id(&id) {
            return self.reject_early(OperationKind::Get, e);
        }
        let snapshot = self.snapshot.clone();
        self.issue(
            OperationKind::Get,
            TransportRequest::new(Method::GET, self.path.member_url(&id)),
            id,
            decode_json::<T>,
            move |record| snapshot.store_record(record.clone()),
        )
    }

    /// Persists a new record. The server assigns its identifier.
    pub fn save(&self, record: &T) -> PendingOperation<T> {
        if let Some(id) = record.id() {
            return self.reject_early(
                OperationKind::Save,
                ServiceError::Validation(format!("record already has identifier {id}")),
            );
        }
        let body = match encode_record(record) {
            Ok(body) => body,
            Err(e) => return self.reject_early(OperationKind::Save, e),
        };
        let url = self.path.collection_url();
        let snapshot = self.snapshot.clone();
        self.issue(
            OperationKind::Save,
            TransportRequest::new(Method::POST, url.clone()).with_body(body),
            url,
            decode_json::<T>,
            move |record| snapshot.store_record(record.clone()),
        )
    }

    /// Replaces an existing record.
    pub fn update(&self, record: &T) -> PendingOperation<T> {
        let id = match record.id() {
            Some(id) => id.to_string(),
            None => {
                return self.reject_early(
                    OperationKind::Update,
                    ServiceError::Validation("record has no identifier".into()),
                )
            }
        };
        if let Err(e) = validate_id(&id) {
            return self.reject_early(OperationKind::Update, e);
        }
        let body = match encode_record(record) {
            Ok(body) => body,
            Err(e) => return self.reject_early(OperationKind::Update, e),
        };
        let snapshot = self.snapshot.clone();
        self.issue(
            OperationKind::Update,
            TransportRequest::new(Method::PUT, self.path.member_url(&id)).with_body(body),
            id,
            decode_json::<T>,
            move |record| snapshot.store_record(record.clone()),
        )
    }

    /// Deletes a record. Fulfils with `()`; any response body is ignored.
    pub fn remove(&self, id: &T::Id) -> PendingOperation<()> {
        let id_text = id.to_string();
        if let Err(e) = validate_id(&id_text) {
            return self.reject_early(OperationKind::Remove, e);
        }
        let snapshot = self.snapshot.clone();
        let removed = id.clone();
        self.issue(
            OperationKind::Remove,
            TransportRequest::new(Method::DELETE, self.path.member_url(&id_text)),
            id_text,
            |_| Ok(()),
            move |_| snapshot.forget_record_if(|record| record.id() == Some(&removed)),
        )
    }

    fn reject_early<R>(&self, kind: OperationKind, error: ServiceError) -> PendingOperation<R> {
        warn!(resource = self.path.name(), %kind, error = %error, "Rejected before dispatch");
        PendingOperation::rejected(kind, error)
    }

    /// Creates the operation handle, attaches the completion handler and dispatches.
    fn issue<R, D, F>(
        &self,
        kind: OperationKind,
        request: TransportRequest,
        target: String,
        decode: D,
        on_fulfilled: F,
    ) -> PendingOperation<R>
    where
        R: Send + 'static,
        D: FnOnce(RawResponse) -> Result<R, ServiceError> + Send + 'static,
        F: FnOnce(&R) + Send + 'static,
    {
        let (pending, settler) = PendingOperation::channel(kind);
        let resource = self.path.name().to_string();
        debug!(resource = %resource, %kind, method = %request.method, url = %request.url, "Issuing request");

        let completion = Completion::new(move |outcome| {
            let result = outcome
                .map_err(ServiceError::from)
                .and_then(|response| classify(kind, &target, response))
                .and_then(decode);
            match &result {
                Ok(value) => {
                    on_fulfilled(value);
                    info!(resource = %resource, %kind, target = %target, "Fulfilled");
                }
                Err(e) => warn!(resource = %resource, %kind, target = %target, error = %e, "Rejected"),
            }
            settler.settle(result);
        });

        self.dispatcher.dispatch(request, completion);
        pending
    }
}

/// Applies the status mapping table. Passes successful responses through untouched.
fn classify(
    kind: OperationKind,
    target: &str,
    response: RawResponse,
) -> Result<RawResponse, ServiceError> {
    if response.is_success() {
        return Ok(response);
    }
    let status = response.status;
    let not_found_is_absence = matches!(
        kind,
        OperationKind::Get | OperationKind::Update | OperationKind::Remove
    );
    let rejects_input = matches!(kind, OperationKind::Save | OperationKind::Update);

    if status == StatusCode::NOT_FOUND && not_found_is_absence {
        Err(ServiceError::NotFound {
            kind,
            target: target.to_string(),
        })
    } else if rejects_input
        && (status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY)
    {
        Err(ServiceError::Validation(response.text()))
    } else {
        Err(TransportError::Status {
            status,
            body: response.text(),
        }
        .into())
    }
}

fn decode_json<V: DeserializeOwned>(response: RawResponse) -> Result<V, ServiceError> {
    serde_json::from_slice(&response.body)
        .map_err(|e| TransportError::MalformedBody(e.to_string()).into())
}

fn encode_record<T: RemoteEntity>(record: &T) -> Result<Vec<u8>, ServiceError> {
    record.validate().map_err(ServiceError::Validation)?;
    serde_json::to_vec(record).map_err(|e| ServiceError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::channel_dispatcher;
    use crate::operation::OperationState;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u32>,
        text: String,
    }

    impl RemoteEntity for Note {
        type Id = u32;

        fn id(&self) -> Option<&u32> {
            self.id.as_ref()
        }

        fn validate(&self) -> Result<(), String> {
            if self.text.is_empty() {
                return Err("text must not be empty".into());
            }
            Ok(())
        }
    }

    fn note(id: Option<u32>, text: &str) -> Note {
        Note {
            id,
            text: text.into(),
        }
    }

    #[test]
    fn classify_maps_not_found_per_operation() {
        let missing = || RawResponse::empty(StatusCode::NOT_FOUND);
        assert!(classify(OperationKind::Get, "1", missing())
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            classify(OperationKind::Query, "/notes", missing()),
            Err(ServiceError::Transport(TransportError::Status { .. }))
        ));
        assert!(classify(
            OperationKind::Save,
            "/notes",
            RawResponse::new(StatusCode::UNPROCESSABLE_ENTITY, "bad")
        )
        .unwrap_err()
        .is_validation());
    }

    #[tokio::test]
    async fn returns_before_transport_completes() {
        let (dispatcher, mut requests) = channel_dispatcher(4);
        let service = RequestService::<Note>::with_dispatcher(
            Arc::new(dispatcher),
            ResourcePath::new("/notes/:id"),
        );

        let pending = service.get(&3);
        assert_eq!(pending.state(), OperationState::Pending);

        let (request, completion) = requests.recv().await.expect("request dispatched");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "/notes/3");
        completion.resolve(RawResponse::json(StatusCode::OK, &note(Some(3), "hi")));

        assert_eq!(pending.state(), OperationState::Fulfilled);
        assert_eq!(pending.await.unwrap(), note(Some(3), "hi"));
        assert_eq!(
            service.snapshot().record().map(|s| s.value.clone()),
            Some(note(Some(3), "hi"))
        );
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_transport() {
        let (dispatcher, mut requests) = channel_dispatcher(4);
        let service = RequestService::<Note>::with_dispatcher(
            Arc::new(dispatcher),
            ResourcePath::new("/notes"),
        );

        assert!(service.save(&note(Some(1), "x")).await.unwrap_err().is_validation());
        assert!(service.save(&note(None, "")).await.unwrap_err().is_validation());
        assert!(service.update(&note(None, "x")).await.unwrap_err().is_validation());
        drop(service);

        assert!(requests.recv().await.is_none());
    }

    #[tokio::test]
    async fn malformed_body_is_a_transport_error() {
        let (dispatcher, mut requests) = channel_dispatcher(4);
        let service = RequestService::<Note>::with_dispatcher(
            Arc::new(dispatcher),
            ResourcePath::new("/notes"),
        );

        let pending = service.query();
        let (_, completion) = requests.recv().await.unwrap();
        completion.resolve(RawResponse::new(StatusCode::OK, "not json"));

        assert!(matches!(
            pending.await,
            Err(ServiceError::Transport(TransportError::MalformedBody(_)))
        ));
        assert!(service.snapshot().collection().is_none());
    }
}
