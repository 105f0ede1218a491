//! Per-instrument ticker engine.
//!
//! A [`TickerEngine`] owns one instrument for its whole life:
//! `Initializing` opens the session and resolves everything that stays fixed
//! while polling, `Polling` runs one fetch, render and push pipeline per
//! interval, and `ShuttingDown` closes every shard it opened.
//!
//! All mutable state (multiplier, decorator, guild list) lives on the
//! engine's own task. Per-guild and per-shard pushes run as joined futures
//! whose results are aggregated and logged here, never written back from
//! another task.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::InstrumentConfig;
use crate::currency::resolve_multiplier;
use crate::models::discord::Guild;
use crate::models::{Quote, RenderedPresence};
use crate::quote::QuoteProvider;
use crate::render::{PairQuote, display_price, render};
use crate::retry::RetryPolicy;
use crate::roles::apply_trend_role;
use crate::session::{GUILD_LIMIT, Session};
use crate::trend::{Decorator, classify};
use crate::{Result, TickerError};

/// Lifecycle phase of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Polling,
    ShuttingDown,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The primary quote could not be fetched; nothing was pushed.
    Skipped,
    /// The presence was rendered and pushed to every guild and shard.
    Rendered(RenderedPresence),
}

/// Outcome of pushing one tick to one guild.
struct GuildPush<'a> {
    guild: &'a Guild,
    nickname: Result<()>,
    role: Option<Result<()>>,
}

/// Polling engine for one configured instrument.
pub struct TickerEngine {
    config: Arc<InstrumentConfig>,
    quotes: Arc<dyn QuoteProvider>,
    rates: Arc<dyn QuoteProvider>,
    session: Arc<dyn Session>,
    policy: RetryPolicy,
    phase: Phase,
    multiplier: f64,
    decorator: Decorator,
    guilds: Vec<Guild>,
    shard_count: u32,
    member_id: Option<String>,
}

impl TickerEngine {
    /// Creates an engine in the `Initializing` phase.
    ///
    /// `quotes` serves the instrument (and its pair), `rates` resolves the
    /// display currency. Backoff of `policy` is kept under half the polling
    /// interval.
    pub fn new(
        config: Arc<InstrumentConfig>,
        quotes: Arc<dyn QuoteProvider>,
        rates: Arc<dyn QuoteProvider>,
        session: Arc<dyn Session>,
        policy: RetryPolicy,
    ) -> Self {
        let policy = policy.within(config.interval());
        let decorator = Decorator::from_config(&config.decorator);
        Self {
            multiplier: config.base_multiplier(),
            config,
            quotes,
            rates,
            session,
            policy,
            phase: Phase::Initializing,
            decorator,
            guilds: Vec::new(),
            shard_count: 0,
            member_id: None,
        }
    }

    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn decorator(&self) -> &Decorator {
        &self.decorator
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Whether ticks render nicknames. Turned off when guilds can't be listed.
    pub fn nickname_mode(&self) -> bool {
        self.config.nickname
    }

    /// Opens every shard, then resolves guilds, currency and label.
    ///
    /// Only shard failures are fatal. If any shard fails to open, every
    /// shard is closed before returning.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::Session`] if the shard count cannot be read or
    /// any shard fails to open.
    pub async fn initialize(&mut self) -> Result<()> {
        let name = self.config.name.as_str();
        let session = self.session.as_ref();

        let shard_count = self
            .policy
            .run("shard count", || session.shard_count())
            .await
            .map_err(|e| TickerError::Session(format!("{name}: shard count: {e}")))?;
        self.shard_count = shard_count;

        let policy = &self.policy;
        let opened = join_all((0..shard_count).map(|shard| async move {
            let result = policy
                .run("open shard", || session.open_shard(shard, shard_count))
                .await;
            (shard, result)
        }))
        .await;

        let mut failed = 0;
        for (shard, result) in &opened {
            if let Err(e) = result {
                error!(instrument = %name, shard, "Unable to open shard: {e}");
                failed += 1;
            }
        }
        if failed > 0 {
            self.close_shards().await;
            return Err(TickerError::Session(format!(
                "{name}: {failed} of {shard_count} shards failed to open"
            )));
        }
        info!(instrument = %name, shards = shard_count, "Session opened");

        if self.config.nickname {
            self.load_guilds().await;
        }

        self.multiplier = resolve_multiplier(
            self.rates.as_ref(),
            &self.policy,
            &self.config.currency,
            self.config.base_multiplier(),
        )
        .await;

        self.set_label().await;
        self.phase = Phase::Polling;
        Ok(())
    }

    async fn load_guilds(&mut self) {
        let session = self.session.as_ref();
        match self
            .policy
            .run("list guilds", || session.list_guilds(GUILD_LIMIT))
            .await
        {
            Ok(guilds) => {
                debug!(instrument = %self.config.name, count = guilds.len(), "Loaded guilds");
                self.guilds = guilds;
            }
            Err(e) => {
                error!(
                    instrument = %self.config.name,
                    "Unable to list guilds, falling back to status mode: {e}"
                );
                let mut degraded = InstrumentConfig::clone(&self.config);
                degraded.nickname = false;
                self.config = Arc::new(degraded);
            }
        }
    }

    /// Sets the bot username to the instrument label unless it already
    /// matches, and resolves the member id used for role swaps.
    async fn set_label(&mut self) {
        let label = self.config.label();
        let session = self.session.as_ref();

        let user = match self.policy.run("current user", || session.current_user()).await {
            Ok(user) => user,
            Err(e) => {
                error!(instrument = %self.config.name, "Unable to read bot user: {e}");
                self.member_id = self.config.client_id.clone();
                return;
            }
        };
        self.member_id = Some(self.config.client_id.clone().unwrap_or(user.id));

        if user.username == label {
            debug!(label = %label, "Username already set");
            return;
        }
        match self
            .policy
            .run("update username", || session.update_username(&label))
            .await
        {
            Ok(()) => info!(label = %label, "Updated username"),
            Err(e) => error!(label = %label, "Unable to update username: {e}"),
        }
    }

    /// Runs one fetch, render and push pipeline.
    pub async fn tick(&mut self) -> TickOutcome {
        let quote = match self.fetch(self.config.quote_id()).await {
            Ok(quote) => quote.converted(self.multiplier),
            Err(e) if e.is_rate_limited() => {
                warn!(instrument = %self.config.name, "Skipping tick: {e}");
                return TickOutcome::Skipped;
            }
            Err(e) => {
                error!(instrument = %self.config.name, "Unable to fetch quote: {e}");
                return TickOutcome::Skipped;
            }
        };

        let price = display_price(&self.config, quote.price);
        let trend = classify(quote.change);
        self.decorator.observe(trend);

        let pair_quote = match (self.config.nickname, self.config.pair.as_deref()) {
            (true, Some(pair)) => Some(
                self.fetch(pair)
                    .await
                    .map(|quote| quote.converted(self.multiplier))
                    .inspect_err(|e| {
                        warn!(instrument = %self.config.name, pair, "Unable to fetch pair: {e}");
                    }),
            ),
            _ => None,
        };
        let pair = match &pair_quote {
            None => PairQuote::NotConfigured,
            Some(Ok(quote)) => PairQuote::Available(quote),
            Some(Err(_)) => PairQuote::Unavailable,
        };

        let presence = render(&self.config, &quote, &price, self.decorator.as_str(), pair);
        if let Some(nickname) = &presence.nickname {
            self.push_nicknames(nickname, trend.increase).await;
        }
        self.push_status(&presence).await;

        debug!(
            instrument = %self.config.name,
            nickname = presence.nickname.as_deref().unwrap_or(""),
            activity = %presence.activity,
            "Tick rendered"
        );
        TickOutcome::Rendered(presence)
    }

    async fn fetch(&self, instrument: &str) -> Result<Quote> {
        let quotes = self.quotes.as_ref();
        self.policy
            .run(quotes.name(), || quotes.fetch(instrument))
            .await
    }

    async fn push_nicknames(&self, nickname: &str, increase: bool) {
        let pushes = join_all(
            self.guilds
                .iter()
                .map(|guild| self.push_guild(guild, nickname, increase)),
        )
        .await;

        for push in pushes {
            let guild = push.guild.id.as_str();
            match push.nickname {
                Ok(()) => debug!(guild, nickname, "Updated nickname"),
                Err(e) => error!(guild, "Unable to set nickname: {e}"),
            }
            match push.role {
                Some(Err(e @ TickerError::RoleLookup(_))) => warn!(guild, "Skipping color: {e}"),
                Some(Err(e)) => error!(guild, "Unable to set color: {e}"),
                Some(Ok(())) | None => {}
            }
        }
    }

    /// Updates the nickname in one guild, then its color role if enabled.
    async fn push_guild<'a>(
        &self,
        guild: &'a Guild,
        nickname: &str,
        increase: bool,
    ) -> GuildPush<'a> {
        let session = self.session.as_ref();
        let result = self
            .policy
            .run("update nickname", || session.update_nickname(&guild.id, nickname))
            .await;

        let role = match (&result, self.config.color, self.member_id.as_deref()) {
            (Ok(()), true, Some(member)) => {
                Some(apply_trend_role(session, &self.policy, &guild.id, member, increase).await)
            }
            (Ok(()), true, None) => Some(Err(TickerError::RoleLookup(
                "bot member id is unknown".to_string(),
            ))),
            _ => None,
        };

        GuildPush {
            guild,
            nickname: result,
            role,
        }
    }

    async fn push_status(&self, presence: &RenderedPresence) {
        let session = self.session.as_ref();
        let policy = &self.policy;
        let pushes = join_all((0..self.shard_count).map(|shard| async move {
            let result = policy
                .run("update status", || {
                    session.update_status(shard, &presence.activity, presence.kind)
                })
                .await;
            (shard, result)
        }))
        .await;

        for (shard, result) in pushes {
            if let Err(e) = result {
                error!(instrument = %self.config.name, shard, "Unable to set status: {e}");
            }
        }
    }

    /// Closes every shard concurrently, logging failures.
    async fn close_shards(&self) {
        let session = self.session.as_ref();
        let policy = &self.policy;
        let closed = join_all((0..self.shard_count).map(|shard| async move {
            let result = policy
                .run("close shard", || session.close_shard(shard))
                .await;
            (shard, result)
        }))
        .await;

        for (shard, result) in closed {
            if let Err(e) = result {
                warn!(instrument = %self.config.name, shard, "Unable to close shard: {e}");
            }
        }
    }

    /// Initializes, then ticks every interval until `shutdown` flips to
    /// `true` or its sender is dropped. The first tick fires one interval
    /// after startup. A tick in flight always completes before shutdown is
    /// observed.
    ///
    /// # Errors
    ///
    /// Returns the initialization error if the session cannot be opened.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.initialize().await?;

        let period = self.config.interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(instrument = %self.config.name, every = ?period, "Polling");

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Enters `ShuttingDown` and closes every shard.
    pub async fn shutdown(&mut self) {
        self.phase = Phase::ShuttingDown;
        info!(instrument = %self.config.name, "Shutting down");
        self.close_shards().await;
    }
}
