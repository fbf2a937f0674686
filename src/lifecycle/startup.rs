//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bind the API listener last (traffic only when ready)
//! - Tear down probe tasks after the server drains
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Logging is initialized by the caller before this runs

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::agent::Agent;
use crate::config::RegistryConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registry::RegistryError;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("registry initialization failed: {0}")]
    Registry(#[from] RegistryError),
}

/// Run the registry until `shutdown` is triggered.
pub async fn run(config: RegistryConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let agent = Arc::new(Agent::new(&config, shutdown.clone())?);

    tracing::info!(
        interval_secs = config.health_check.interval_secs,
        timeout_secs = config.health_check.timeout_secs,
        tls_skip_verify = config.health_check.tls_skip_verify,
        duplicate_policy = ?config.registry.duplicate_policy,
        "Registry initialized"
    );

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let server = HttpServer::new(config, agent.clone());
    let result = server.run(listener, shutdown).await;

    agent.shutdown();
    result.map_err(StartupError::from)
}
