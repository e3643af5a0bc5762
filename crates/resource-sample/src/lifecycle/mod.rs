//! # Lifecycle & Wiring
//!
//! Starts the pieces a [`UserClient`](crate::clients::UserClient) needs, wires them
//! together, and tears them down again.
//!
//! - [`config`] - [`DirectoryConfig`], loaded from the environment
//! - [`directory`] - [`UserDirectory`], which owns the backend task and the client
//! - [`telemetry`] - [`setup_tracing`], the tracing subscriber for binaries
//!
//! ## Shutdown
//!
//! The backend task ends when its channel closes, which happens once every client clone
//! is dropped. [`UserDirectory::shutdown`] drops its own client and awaits the task, so
//! callers must drop any clones they made first.

pub mod config;
pub mod directory;
pub mod telemetry;

pub use config::*;
pub use directory::*;
pub use telemetry::*;
