//! Runs one function-invocation event through the relay.
//!
//! Usage: `chathooks-invoke [config.toml] [event.json | -]`
//!
//! The event is read from the given file, or from stdin when the path is `-`
//! or omitted. The invocation response is printed to stdout as JSON; logs go
//! to stderr.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chathooks::config::Config;
use chathooks::dispatch::Dispatcher;
use chathooks::transport::event::{handle_event, InvocationEvent};

fn read_event(path: Option<&str>) -> Result<String> {
    match path {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            Ok(buf)
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file: {}", path)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chathooks=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let dispatcher = Dispatcher::from_config(&config)?;

    let raw = read_event(args.get(2).map(String::as_str))?;
    let event: InvocationEvent =
        serde_json::from_str(&raw).context("Event is not a valid invocation event")?;

    let response = handle_event(&dispatcher, event).await;
    info!("Invocation finished with status {}", response.status_code);

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
