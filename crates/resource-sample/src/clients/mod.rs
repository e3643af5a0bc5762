//! Type-safe wrappers around [`RequestService`](resource_service::RequestService).

pub mod user_client;

pub use user_client::*;
