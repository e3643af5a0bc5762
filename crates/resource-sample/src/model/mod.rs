//! Plain data structures implementing [`RemoteEntity`](resource_service::RemoteEntity).

pub mod user;

pub use user::*;
