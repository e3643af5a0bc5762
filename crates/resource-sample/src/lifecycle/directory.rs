//! # Directory
//!
//! [`UserDirectory`] starts the in-process User backend, wires a client to it and shuts
//! the pair down in order.

use crate::clients::UserClient;
use crate::lifecycle::DirectoryConfig;
use http::Method;
use resource_service::{MemoryServer, RequestService};
use std::sync::Arc;
use tracing::{error, info};

/// Owns the User backend task and the client that talks to it.
///
/// # Example
///
/// ```ignore
/// let directory = UserDirectory::start(&DirectoryConfig::from_env()?);
/// let alice = directory.user_client.register(params).await?;
/// directory.shutdown().await?;
/// ```
pub struct UserDirectory {
    /// Client for the User collection
    pub user_client: UserClient,

    /// Backend task handle (awaited on shutdown)
    handle: tokio::task::JoinHandle<()>,
}

impl UserDirectory {
    /// Spawns an in-process backend for the configured collection and builds its client.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &DirectoryConfig) -> Self {
        let path = config.resource_path();
        let (mut server, dispatcher) = MemoryServer::new(path.collection_url());

        let latency = config.latency();
        if !latency.is_zero() {
            for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
                server = server.with_latency(method, latency);
            }
        }

        let handle = tokio::spawn(server.run());
        let service = RequestService::with_dispatcher(Arc::new(dispatcher), path);
        info!(resource = %service.path(), "User directory started");

        Self {
            user_client: UserClient::new(service),
            handle,
        }
    }

    /// Drops the client and waits for the backend task to finish.
    ///
    /// Clones of `user_client` keep the backend alive, so drop them first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down user directory...");
        drop(self.user_client);

        if let Err(e) = self.handle.await {
            error!("Backend task failed: {:?}", e);
            return Err(format!("Backend task failed: {:?}", e));
        }

        info!("User directory shutdown complete.");
        Ok(())
    }
}
