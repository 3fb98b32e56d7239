//! HTTP server hosting one checker

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use super::rest::create_api_router;
use crate::config::EnoConfig;
use crate::dispatcher::TaskDispatcher;
use crate::error::{EnoError, EnoResult};
use crate::registry::{CheckerDeps, CheckerRegistry};

/// Checker service: router plus bind address
pub struct CheckerServer {
    bind_address: SocketAddr,
    dispatcher: TaskDispatcher,
}

impl CheckerServer {
    pub fn new(bind_address: SocketAddr, dispatcher: TaskDispatcher) -> Self {
        Self {
            bind_address,
            dispatcher,
        }
    }

    /// Build the configured checker from `registry` and wrap it in a server
    pub fn from_config(config: EnoConfig, registry: &CheckerRegistry) -> EnoResult<Self> {
        config.validate()?;
        let bind_address: SocketAddr = config.server.bind_address.parse()?;
        let checker_name = config.checker.name.clone();
        let deps = CheckerDeps::new(config);
        let checker = registry.build(&checker_name, &deps)?;
        Ok(Self::new(bind_address, TaskDispatcher::new(checker)))
    }

    pub fn create_router(&self) -> Router {
        create_api_router(self.dispatcher.clone())
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> EnoResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.bind_address)
            .await
            .map_err(|e| {
                EnoError::network(format!("Failed to bind to {}: {}", self.bind_address, e))
            })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> EnoResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.create_router();
        let local = listener.local_addr()?;
        info!(
            address = %local,
            service = %self.dispatcher.info().service_name,
            "Checker service listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| EnoError::Internal {
                message: format!("HTTP server error: {}", e),
            })?;

        info!("Checker service stopped");
        Ok(())
    }
}
