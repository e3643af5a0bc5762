//! # Transport Boundary
//!
//! The service never talks to the network itself. It hands a [`TransportRequest`] to a
//! transport and waits for a [`RawResponse`] (or a [`TransportError`]) to come back.
//!
//! Two shapes of transport are supported:
//!
//! - [`Transport`]: the async shape, `request(req).await -> Result<RawResponse, _>`.
//!   This is what an HTTP client adapter normally implements.
//! - [`Dispatcher`]: the callback shape. The transport receives a [`Completion`] and calls
//!   it when the exchange is over. A [`Completion`] only ever fires once; later calls are
//!   ignored and logged.
//!
//! [`Spawned`] turns any [`Transport`] into a [`Dispatcher`] by driving each request on its
//! own tokio task, so it must be used from within a tokio runtime.

use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// One request to be carried by a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    /// JSON body, present for `POST` and `PUT`.
    pub body: Option<Bytes>,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// What came back from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Response with a JSON body serialized from `value`.
    pub fn json<V: serde::Serialize + ?Sized>(status: StatusCode, value: &V) -> Self {
        // Serializing plain data into a Vec cannot fail.
        let body = serde_json::to_vec(value).unwrap_or_default();
        Self::new(status, body)
    }

    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, Bytes::new())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, lossily decoded. Used for error reporting.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Async transport: performs the exchange and returns its outcome.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn request(&self, request: TransportRequest) -> Result<RawResponse, TransportError>;
}

/// Callback transport: starts the exchange and reports through `completion`.
///
/// Implementations must not block. They may complete synchronously inside `dispatch`,
/// or later from any thread.
pub trait Dispatcher: Send + Sync + 'static {
    fn dispatch(&self, request: TransportRequest, completion: Completion);
}

type Handler = Box<dyn FnOnce(Result<RawResponse, TransportError>) + Send>;

/// Once-only completion handle passed to a [`Dispatcher`].
///
/// Cloning is allowed so a transport can hand it to whichever code path finishes first.
/// Only the first call to [`complete`](Completion::complete) reaches the operation. If every
/// clone is dropped without firing, the operation rejects with
/// [`TransportError::Abandoned`].
#[derive(Clone)]
pub struct Completion {
    handler: Arc<Mutex<Option<Handler>>>,
}

impl Completion {
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: FnOnce(Result<RawResponse, TransportError>) + Send + 'static,
    {
        Self {
            handler: Arc::new(Mutex::new(Some(Box::new(handler)))),
        }
    }

    /// Delivers the outcome. Returns `false` if this completion had already fired.
    pub fn complete(&self, outcome: Result<RawResponse, TransportError>) -> bool {
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handler {
            Some(handler) => {
                handler(outcome);
                true
            }
            None => {
                warn!("Completion fired more than once, ignoring");
                false
            }
        }
    }

    pub fn resolve(&self, response: RawResponse) -> bool {
        self.complete(Ok(response))
    }

    pub fn reject(&self, error: TransportError) -> bool {
        self.complete(Err(error))
    }

    pub fn is_completed(&self) -> bool {
        self.handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// Adapts an async [`Transport`] into a [`Dispatcher`] by spawning one task per request.
pub struct Spawned<T: Transport> {
    inner: Arc<T>,
}

impl<T: Transport> Spawned<T> {
    pub fn new(transport: T) -> Self {
        Self {
            inner: Arc::new(transport),
        }
    }
}

impl<T: Transport> Dispatcher for Spawned<T> {
    fn dispatch(&self, request: TransportRequest, completion: Completion) {
        let transport = self.inner.clone();
        tokio::spawn(async move {
            debug!(method = %request.method, url = %request.url, "Dispatching");
            let outcome = transport.request(request).await;
            completion.complete(outcome);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn completion_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let completion = Completion::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let duplicate = completion.clone();

        assert!(completion.resolve(RawResponse::empty(StatusCode::OK)));
        assert!(!duplicate.reject(TransportError::Connection("late".into())));
        assert!(completion.is_completed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn json_response_round_trips_body() {
        let response = RawResponse::json(StatusCode::CREATED, &serde_json::json!({"id": "1"}));
        assert!(response.is_success());
        assert_eq!(response.text(), r#"{"id":"1"}"#);
    }
}
