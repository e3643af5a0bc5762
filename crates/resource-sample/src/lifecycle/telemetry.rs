//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG`.
//!
//! ```bash
//! RUST_LOG=info cargo run      # fulfilments, rejections, backend writes
//! RUST_LOG=debug cargo run     # every request with method and URL
//! ```
//!
//! With `RUST_LOG=info` a registration looks like:
//!
//! ```text
//! INFO Created collection="/api/users" size=1
//! INFO register: Fulfilled resource="users" kind=save target="/api/users"
//! ```

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
