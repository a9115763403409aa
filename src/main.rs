use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chathooks::config::Config;
use chathooks::dispatch::Dispatcher;
use chathooks::transport;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chathooks=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let dispatcher = Dispatcher::from_config(&config)?;

    info!("Configuration loaded successfully");
    info!("  Input types: {}", dispatcher.registry().source_keys().join(", "));
    info!("  Output types: {}", dispatcher.registry().adapter_keys().join(", "));
    info!("  Default output: {}", config.delivery.default_output);
    info!("  Delivery timeout: {}s", config.delivery.timeout_secs);
    if dispatcher.access().is_open() {
        warn!("  Access control: OFF ([auth] tokens is empty, every request is accepted)");
    } else {
        info!("  Access control: {} token(s)", dispatcher.access().len());
    }

    transport::http::serve(&config.bind_address(), Arc::new(dispatcher)).await
}
