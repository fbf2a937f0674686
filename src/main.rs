//! Service Registry (v1)
//!
//! An in-memory service registry with active HTTP health checks, built with
//! Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────────┐
//!                        │                 SERVICE REGISTRY                  │
//!                        │                                                   │
//!   register/deregister  │  ┌─────────┐    ┌─────────┐    ┌──────────────┐   │
//!   ─────────────────────┼─▶│  http   │───▶│  agent  │───▶│   registry   │   │
//!                        │  │ server  │    │         │    │    store     │   │
//!                        │  └─────────┘    └────┬────┘    └──────▲───────┘   │
//!                        │       ▲              │ watch/unwatch  │ status    │
//!   discovery query      │       │              ▼                │ updates   │
//!   ─────────────────────┼───────┤        ┌──────────┐    ┌──────┴───────┐   │   GET /health
//!                        │       │        │  query   │    │    health    │───┼──────────────▶ Instance
//!                        │       └────────│  engine  │    │   checker    │◀──┼───────────────
//!                        │                └──────────┘    └──────────────┘   │
//!                        │                                                   │
//!                        │  config · observability · lifecycle               │
//!                        └───────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use service_registry::config::loader::load_config;
use service_registry::lifecycle::{signals, startup};
use service_registry::observability::logging;
use service_registry::{RegistryConfig, Shutdown};

#[derive(Parser)]
#[command(name = "service-registry")]
#[command(about = "Service registry with health-gated discovery", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RegistryConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("service-registry v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_file = ?args.config,
        bind_address = %config.listener.bind_address,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    startup::run(config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
