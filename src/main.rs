use ticker_bots::TickerError;
use ticker_bots::config::fetch_config;
use ticker_bots::quote::http_client;
use ticker_bots::supervisor::{Supervisor, build_engine, load_instruments};
use ticker_bots::tls::install_crypto_provider;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), TickerError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    install_crypto_provider();
    let app_config = fetch_config()?;
    let http = http_client()?;

    let instruments = load_instruments(&app_config.config_dir)?;
    if instruments.is_empty() {
        warn!(dir = %app_config.config_dir.display(), "No instruments configured");
    }

    let mut supervisor = Supervisor::new();
    for config in instruments {
        supervisor.spawn(build_engine(config, &app_config, &http));
    }
    info!(engines = supervisor.len(), "Ticker bots running");

    // Engines that fail to start do not end the process.
    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, stopping engines");
    supervisor.shutdown();
    supervisor.wait().await;

    Ok(())
}
