use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paywallet::cache::spawn_eviction_task;
use paywallet::cli::{run_command, Cli};
use paywallet::config::Config;
use paywallet::ClientState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config)?;
    cli.apply_overrides(&mut config);

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting PayWallet client v{}", env!("CARGO_PKG_VERSION"));

    let eviction_interval = config.cache.eviction_interval_secs;
    let state = ClientState::open(config).context("Failed to initialize client")?;
    spawn_eviction_task(state.cache.clone(), eviction_interval);

    run_command(&cli, &state).await
}
