//! # Pending Operations
//!
//! A [`PendingOperation`] is the handle every [`RequestService`](crate::RequestService)
//! operation returns. It is a thin wrapper over a `tokio::sync::oneshot` receiver: the
//! sending half lives inside the completion handler attached to the transport call, so
//! the operation can settle at most once.
//!
//! The handle can be awaited like any other future, or polled for its current
//! [`OperationState`] without consuming it.

use crate::error::{ServiceError, TransportError};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// The five operations a [`RequestService`](crate::RequestService) exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Get,
    Save,
    Update,
    Remove,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Query => "query",
            OperationKind::Get => "get",
            OperationKind::Save => "save",
            OperationKind::Update => "update",
            OperationKind::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// Resolution state of a [`PendingOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Pending,
    Fulfilled,
    Rejected,
}

const PENDING: u8 = 0;
const FULFILLED: u8 = 1;
const REJECTED: u8 = 2;

/// Shared, write-once state cell between a [`PendingOperation`] and its settler.
#[derive(Debug, Clone, Default)]
pub(crate) struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub(crate) fn load(&self) -> OperationState {
        match self.0.load(Ordering::Acquire) {
            FULFILLED => OperationState::Fulfilled,
            REJECTED => OperationState::Rejected,
            _ => OperationState::Pending,
        }
    }

    /// Moves the cell out of `Pending`. Returns `false` if it had already settled.
    fn settle(&self, fulfilled: bool) -> bool {
        let next = if fulfilled { FULFILLED } else { REJECTED };
        self.0
            .compare_exchange(PENDING, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Sending half of a [`PendingOperation`], owned by the completion handler.
///
/// Dropping it without settling marks the operation `Rejected` straight away, so
/// [`PendingOperation::state`] reflects an abandoned request before anyone polls it.
pub(crate) struct Settler<R> {
    sender: Option<oneshot::Sender<Result<R, ServiceError>>>,
    state: StateCell,
}

impl<R> Settler<R> {
    /// Delivers the outcome. Consumes the settler, so it can only ever run once.
    pub(crate) fn settle(mut self, outcome: Result<R, ServiceError>) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        if self.state.settle(outcome.is_ok()) {
            // The caller may have dropped the handle; the outcome is then ignored.
            let _ = sender.send(outcome);
        }
    }
}

impl<R> Drop for Settler<R> {
    fn drop(&mut self) {
        // The receiver observes the closed channel as `Abandoned`.
        if self.sender.take().is_some() {
            self.state.settle(false);
        }
    }
}

/// Handle to one in-flight request.
///
/// Awaiting it yields `Ok(R)` when the transport call succeeded and the response decoded,
/// or a [`ServiceError`] otherwise. Dropping it does not cancel the request; the outcome
/// is simply discarded.
#[must_use = "an operation's outcome is lost unless the handle is awaited"]
pub struct PendingOperation<R> {
    kind: OperationKind,
    receiver: oneshot::Receiver<Result<R, ServiceError>>,
    state: StateCell,
}

impl<R> PendingOperation<R> {
    pub(crate) fn channel(kind: OperationKind) -> (Self, Settler<R>) {
        let (sender, receiver) = oneshot::channel();
        let state = StateCell::default();
        let settler = Settler {
            sender: Some(sender),
            state: state.clone(),
        };
        let pending = Self {
            kind,
            receiver,
            state,
        };
        (pending, settler)
    }

    /// An operation that is already rejected, used when input fails validation before any
    /// transport call is made.
    pub(crate) fn rejected(kind: OperationKind, error: ServiceError) -> Self {
        let (pending, settler) = Self::channel(kind);
        settler.settle(Err(error));
        pending
    }

    /// Which operation produced this handle.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Current resolution state. Does not consume the outcome.
    pub fn state(&self) -> OperationState {
        self.state.load()
    }

    pub fn is_settled(&self) -> bool {
        self.state() != OperationState::Pending
    }
}

impl<R> fmt::Debug for PendingOperation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOperation")
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish()
    }
}

impl<R> Future for PendingOperation<R> {
    type Output = Result<R, ServiceError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => {
                this.state.settle(false);
                Poll::Ready(Err(ServiceError::Transport(TransportError::Abandoned)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
