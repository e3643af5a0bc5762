//! # Service Errors
//!
//! Every failure of a [`RequestService`](crate::RequestService) operation surfaces as one of
//! these values on the rejection path of its [`PendingOperation`](crate::PendingOperation).
//! Transport-level failures are kept separate from the resource-level ones so callers can
//! tell "the network broke" apart from "the server said no".

use crate::operation::OperationKind;
use http::StatusCode;

/// Failure reported by (or on behalf of) a transport.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The exchange completed but the server answered with a non-success status.
    #[error("Unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// The exchange could not be completed at all.
    #[error("Connection failed: {0}")]
    Connection(String),
    /// The response body could not be decoded into the expected shape.
    #[error("Malformed response body: {0}")]
    MalformedBody(String),
    /// Every completion handle was dropped without delivering an outcome.
    #[error("Transport dropped the request without completing it")]
    Abandoned,
}

/// Errors returned by the five resource operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("{kind} failed: resource not found: {target}")]
    NotFound { kind: OperationKind, target: String },
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }

    /// Status code carried by the failure, if the server produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ServiceError::Transport(TransportError::Status { status, .. }) => Some(*status),
            ServiceError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }
}
