//! # Resource Sample Library
//!
//! A `User` resource served through [`resource_service`], with a domain client and a
//! lifecycle that wires it to an in-process backend. Exposed as a library for integration
//! testing.

pub mod clients;
pub mod error;
pub mod lifecycle;
pub mod model;
