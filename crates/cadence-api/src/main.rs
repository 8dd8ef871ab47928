//! Binary entrypoint for the Cadence API server.
use anyhow::Context;
use cadence_api::{run, AppState, ServiceConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // CADENCE_CONFIG names the YAML file; CADENCE_ADDR overrides the listen address
    let config = ServiceConfig::from_env().context("loading service configuration")?;
    let state = AppState::from_config(&config).context("building service state")?;

    run(&config.listen_addr, state)
        .await
        .with_context(|| format!("serving on {}", config.listen_addr))
}
