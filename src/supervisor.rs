//! Runs one [`TickerEngine`] per configured instrument.

use std::path::Path;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::Result;
use crate::config::{AppConfig, InstrumentConfig, discover_instruments};
use crate::engine::TickerEngine;
use crate::quote::{exchange_rates, provider_for};
use crate::session::DiscordSession;

/// Loads every live instrument in `dir`, in file-name order.
///
/// A source that cannot be read, parsed or validated is logged and skipped.
///
/// # Errors
///
/// Returns [`TickerError::Io`](crate::TickerError::Io) if `dir` cannot be
/// listed.
pub fn load_instruments(dir: &Path) -> Result<Vec<InstrumentConfig>> {
    let mut instruments = Vec::new();
    for path in discover_instruments(dir)? {
        match InstrumentConfig::load(&path) {
            Ok(config) => instruments.push(config),
            Err(e) => error!(path = %path.display(), "Skipping instrument: {e}"),
        }
    }
    Ok(instruments)
}

/// Wires an engine for `config` against the real providers and platform.
pub fn build_engine(config: InstrumentConfig, app: &AppConfig, http: &Client) -> TickerEngine {
    let quotes = provider_for(&config, &app.endpoints, http);
    let rates = exchange_rates(&app.endpoints, http);
    let session = Arc::new(DiscordSession::new(
        http.clone(),
        &app.endpoints.discord,
        config.token.clone(),
    ));
    TickerEngine::new(Arc::new(config), quotes, rates, session, app.retry)
}

/// Owns the running engines and their shared shutdown signal.
pub struct Supervisor {
    engines: JoinSet<(String, Result<()>)>,
    shutdown: watch::Sender<bool>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            engines: JoinSet::new(),
            shutdown,
        }
    }

    /// Starts `engine` as an independent task.
    pub fn spawn(&mut self, engine: TickerEngine) {
        let name = engine.config().name.clone();
        let shutdown = self.shutdown.subscribe();
        info!(instrument = %name, "Starting engine");
        self.engines
            .spawn(async move { (name, engine.run(shutdown).await) });
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Asks every engine to stop after its current tick.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Waits for every engine to finish, logging how each one ended.
    pub async fn wait(&mut self) {
        while let Some(joined) = self.engines.join_next().await {
            match joined {
                Ok((name, Ok(()))) => info!(instrument = %name, "Engine stopped"),
                Ok((name, Err(e))) => error!(instrument = %name, "Engine failed: {e}"),
                Err(e) => warn!("Engine task aborted: {e}"),
            }
        }
    }
}
