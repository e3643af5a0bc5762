//! Error types for user operations.

use resource_service::ServiceError;
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    /// The requested user was not found.
    #[error("User not found: {0}")]
    NotFound(String),

    /// The user data provided is invalid.
    #[error("User validation error: {0}")]
    ValidationError(String),

    /// The request could not be carried out by the transport.
    #[error("User service unavailable: {0}")]
    Unavailable(String),
}

impl From<ServiceError> for UserError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound { target, .. } => UserError::NotFound(target),
            ServiceError::Validation(msg) => UserError::ValidationError(msg),
            ServiceError::Transport(e) => UserError::Unavailable(e.to_string()),
        }
    }
}
