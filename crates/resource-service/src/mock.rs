//! # Mock Transports & Testing Guide
//!
//! Services are only as testable as their transport. This module provides two stand-ins
//! so code built on [`RequestService`](crate::RequestService) can be tested without a
//! network:
//!
//! | Tool | Shape | Use it when |
//! |------|-------|-------------|
//! | [`MockTransport`] | async [`Transport`] | You know which requests will be made and want canned answers |
//! | [`channel_dispatcher`] | callback [`Dispatcher`] | You want to drive completions by hand: late, out of order, or twice |
//! | [`MemoryServer`](crate::memory::MemoryServer) | callback [`Dispatcher`] | You want a backend with real state (create, then read it back) |
//!
//! ## Pattern 1: Canned Responses
//!
//! ```rust
//! use resource_service::mock::MockTransport;
//! use resource_service::{RemoteEntity, RequestService, ResourcePath};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! struct User { id: Option<u32>, name: String }
//! impl RemoteEntity for User {
//!     type Id = u32;
//!     fn id(&self) -> Option<&u32> { self.id.as_ref() }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_get("/users/9").return_status(404);
//!
//!     let users = RequestService::<User>::new(mock.clone(), ResourcePath::new("/users/:id"));
//!     let err = users.get(&9).await.unwrap_err();
//!     assert!(err.is_not_found());
//!     mock.verify();
//! }
//! ```
//!
//! ## Pattern 2: Driving Completions by Hand
//!
//! ```rust
//! use resource_service::mock::{channel_dispatcher, expect_request};
//! use resource_service::{RawResponse, RemoteEntity, RequestService, ResourcePath};
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
//! struct User { id: Option<u32>, name: String }
//! impl RemoteEntity for User {
//!     type Id = u32;
//!     fn id(&self) -> Option<&u32> { self.id.as_ref() }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (dispatcher, mut requests) = channel_dispatcher(8);
//!     let users = RequestService::<User>::with_dispatcher(Arc::new(dispatcher), ResourcePath::new("/users"));
//!
//!     let pending = users.get(&1);
//!     let (request, completion) = expect_request(&mut requests).await.unwrap();
//!     assert_eq!(request.url, "/users/1");
//!
//!     let alice = User { id: Some(1), name: "Alice".into() };
//!     completion.resolve(RawResponse::json(http::StatusCode::OK, &alice));
//!     assert_eq!(pending.await.unwrap(), alice);
//! }
//! ```
//!
//! ## Testing Failure Scenarios
//!
//! [`ExpectationBuilder::return_err`] injects failures that are hard to produce against a
//! real server (connection resets, truncated bodies), and
//! [`ExpectationBuilder::with_latency`] makes one response slower than another.

use crate::error::TransportError;
use crate::transport::{Completion, Dispatcher, RawResponse, Transport, TransportRequest};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

struct Expectation {
    method: Method,
    url: String,
    latency: Duration,
    response: Result<RawResponse, TransportError>,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    received: Vec<TransportRequest>,
    unexpected: Vec<String>,
}

/// An async transport that answers from a queue of expectations.
///
/// Each request consumes the oldest expectation with the same `(method, url)`, so requests
/// racing on separate tasks may arrive in any order. A request with no matching
/// expectation fails with [`TransportError::Connection`] and is reported
/// by [`verify`](MockTransport::verify).
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(&self, method: Method, url: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            url: url.into(),
            latency: Duration::ZERO,
            state: self.state.clone(),
        }
    }

    pub fn expect_get(&self, url: impl Into<String>) -> ExpectationBuilder {
        self.expect(Method::GET, url)
    }

    pub fn expect_post(&self, url: impl Into<String>) -> ExpectationBuilder {
        self.expect(Method::POST, url)
    }

    pub fn expect_put(&self, url: impl Into<String>) -> ExpectationBuilder {
        self.expect(Method::PUT, url)
    }

    pub fn expect_delete(&self, url: impl Into<String>) -> ExpectationBuilder {
        self.expect(Method::DELETE, url)
    }

    /// Every request received so far, in arrival order.
    pub fn received(&self) -> Vec<TransportRequest> {
        self.state.lock().unwrap().received.clone()
    }

    /// Panics unless every expectation was consumed and no unexpected request arrived.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        if !state.unexpected.is_empty() {
            panic!("Unexpected requests: {:?}", state.unexpected);
        }
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        let expectation = {
            let mut state = self.state.lock().unwrap();
            state.received.push(request.clone());
            let position = state
                .expectations
                .iter()
                .position(|e| e.method == request.method && e.url == request.url);
            if let Some(position) = position {
                state.expectations.remove(position)
            } else {
                state
                    .unexpected
                    .push(format!("{} {}", request.method, request.url));
                None
            }
        };

        match expectation {
            Some(expectation) => {
                if !expectation.latency.is_zero() {
                    tokio::time::sleep(expectation.latency).await;
                }
                expectation.response
            }
            None => Err(TransportError::Connection(format!(
                "no expectation for {} {}",
                request.method, request.url
            ))),
        }
    }
}

/// Builder for one expected request.
pub struct ExpectationBuilder {
    method: Method,
    url: String,
    latency: Duration,
    state: Arc<Mutex<MockState>>,
}

impl ExpectationBuilder {
    /// Delays the response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn return_response(self, response: RawResponse) {
        self.push(Ok(response));
    }

    pub fn return_json<V: serde::Serialize + ?Sized>(self, status: u16, value: &V) {
        self.push(Ok(RawResponse::json(status_code(status), value)));
    }

    pub fn return_status(self, status: u16) {
        self.push(Ok(RawResponse::empty(status_code(status))));
    }

    pub fn return_body(self, status: u16, body: impl Into<Bytes>) {
        self.push(Ok(RawResponse::new(status_code(status), body)));
    }

    pub fn return_err(self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<RawResponse, TransportError>) {
        let mut state = self.state.lock().unwrap();
        state.expectations.push_back(Expectation {
            method: self.method,
            url: self.url,
            latency: self.latency,
            response,
        });
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).expect("valid HTTP status code")
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// A dispatcher that forwards every request, with its completion, to a channel.
#[derive(Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::Sender<(TransportRequest, Completion)>,
}

impl Dispatcher for ChannelDispatcher {
    fn dispatch(&self, request: TransportRequest, completion: Completion) {
        if let Err(e) = self.sender.try_send((request, completion)) {
            // Dropping the completion here rejects the operation as abandoned.
            tracing::warn!(error = %e, "Channel dispatcher could not forward request");
        }
    }
}

/// Creates a dispatcher and the receiver a test reads requests from.
///
/// # Testing Strategy
/// The test plays the server: it takes each `(request, completion)` pair off the receiver,
/// asserts on the request, and decides when and how to complete it. This is the only way
/// to exercise ordering and duplicate-completion behavior deterministically.
pub fn channel_dispatcher(
    buffer_size: usize,
) -> (
    ChannelDispatcher,
    mpsc::Receiver<(TransportRequest, Completion)>,
) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ChannelDispatcher { sender }, receiver)
}

/// Waits for the next dispatched request.
pub async fn expect_request(
    receiver: &mut mpsc::Receiver<(TransportRequest, Completion)>,
) -> Option<(TransportRequest, Completion)> {
    receiver.recv().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_in_order_and_verifies() {
        let mock = MockTransport::new();
        mock.expect_get("/a").return_status(200);
        mock.expect_delete("/a").return_status(204);
        mock.expect_put("/a")
            .return_response(RawResponse::new(StatusCode::ACCEPTED, "queued"));

        let first = mock.request(TransportRequest::new(Method::GET, "/a")).await;
        let second = mock.request(TransportRequest::new(Method::DELETE, "/a")).await;
        let third = mock.request(TransportRequest::new(Method::PUT, "/a")).await.unwrap();

        assert_eq!(first.unwrap().status, StatusCode::OK);
        assert_eq!(second.unwrap().status, StatusCode::NO_CONTENT);
        assert_eq!(third.status, StatusCode::ACCEPTED);
        assert_eq!(third.text(), "queued");
        assert_eq!(mock.received().len(), 3);
        mock.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Unexpected requests")]
    async fn unexpected_request_fails_verification() {
        let mock = MockTransport::new();
        mock.expect_get("/a").return_status(200);

        let result = mock.request(TransportRequest::new(Method::GET, "/b")).await;
        assert!(matches!(result, Err(TransportError::Connection(_))));
        mock.verify();
    }
}
