//! Process settings and per-instrument configuration.
//!
//! Process-wide settings come from environment variables (all optional):
//! - `TICKERS_CONFIG_DIR` - directory holding one JSON file per instrument
//! - `COINGECKO_API_URL`, `PONY_API_URL`, `YAHOO_API_URL` - quote endpoints
//! - `DISCORD_API_URL` - chat platform REST endpoint
//! - `TICKERS_REQUEST_TIMEOUT_SECS` - deadline for every external call
//! - `TICKERS_MAX_RETRIES` - extra attempts per external call (default none)
//!
//! Each instrument is described by a JSON file in the config directory.
//! `sample.json` documents the format and is never started.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use zeroize::Zeroizing;

use crate::format::PrecisionPolicy;
use crate::retry::RetryPolicy;
use crate::{Result, TickerError};

const DEFAULT_CONFIG_DIR: &str = "./bots";
const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_PONY_URL: &str = "https://ponyfinance-api-eu256.ondigitalocean.app";
const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_DISCORD_URL: &str = "https://discord.com/api/v10";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// File name of the documented example that is never treated as live.
pub const SAMPLE_FILE: &str = "sample.json";

/// Currency every provider quotes in.
pub const BASE_CURRENCY: &str = "USD";

/// Platform limit on bot usernames.
pub const MAX_LABEL_LEN: usize = 32;

/// Top-level process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_dir: PathBuf,
    pub endpoints: Endpoints,
    pub retry: RetryPolicy,
}

/// Base URLs of every external service.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub coingecko: String,
    pub pony: String,
    pub yahoo: String,
    pub discord: String,
}

/// Loads the process configuration from environment variables.
///
/// Every value has a default; empty variables count as unset.
///
/// # Errors
///
/// Returns [`TickerError::Config`] if a numeric setting does not parse or
/// the request timeout is zero.
pub fn fetch_config() -> Result<AppConfig> {
    let config_dir = non_empty_var("TICKERS_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));

    let timeout_secs: u64 =
        parse_var("TICKERS_REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(TickerError::Config(
            "TICKERS_REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
        ));
    }
    let max_retries: u32 = parse_var("TICKERS_MAX_RETRIES")?.unwrap_or(0);

    Ok(AppConfig {
        config_dir,
        endpoints: Endpoints {
            coingecko: url_var("COINGECKO_API_URL", DEFAULT_COINGECKO_URL),
            pony: url_var("PONY_API_URL", DEFAULT_PONY_URL),
            yahoo: url_var("YAHOO_API_URL", DEFAULT_YAHOO_URL),
            discord: url_var("DISCORD_API_URL", DEFAULT_DISCORD_URL),
        },
        retry: RetryPolicy::new(Duration::from_secs(timeout_secs), max_retries),
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn url_var(name: &str, default: &str) -> String {
    non_empty_var(name)
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    non_empty_var(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| TickerError::Config(format!("{name}={raw:?} is not a number: {e}")))
        })
        .transpose()
}

/// A credential that never shows up in `Debug` output and is wiped on drop.
#[derive(Clone, Default)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(Zeroizing::new(value))
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret::from)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// What the status line shows in nickname mode when no pair is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivityKind {
    /// 24h change and change percent.
    #[default]
    Change,
    /// Market capitalisation, rendered as `<amount> TVL`.
    MarketCap,
}

impl<'de> Deserialize<'de> for ActivityKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw.eq_ignore_ascii_case("marketcap") {
            Self::MarketCap
        } else {
            Self::Change
        })
    }
}

/// Crypto quote backend named by the `api` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuoteApi {
    #[default]
    CoinGecko,
    Pony,
}

impl<'de> Deserialize<'de> for QuoteApi {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.to_ascii_lowercase().as_str() {
            "" | "coingecko" | "gecko" => Ok(Self::CoinGecko),
            "pony" => Ok(Self::Pony),
            other => Err(serde::de::Error::custom(format!("unknown api {other:?}"))),
        }
    }
}

/// The provider that actually serves an instrument's quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    CoinGecko,
    Pony,
    Yahoo,
}

/// One instrument's bot, as loaded from its JSON source.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    /// Display symbol override; for Pony instruments it names the metric.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ticker: Option<String>,
    /// Provider-side instrument id (e.g. `bitcoin`).
    pub name: String,
    #[serde(default)]
    pub name_prefix: String,
    /// Render into the guild nickname instead of only the status line.
    #[serde(default)]
    pub nickname: bool,
    /// Polling interval in seconds.
    pub frequency: u64,
    /// Swap `tickers-red`/`tickers-green` roles with the trend.
    #[serde(default)]
    pub color: bool,
    /// Fixed decorator; empty selects automatic arrows.
    #[serde(default)]
    pub decorator: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default)]
    pub decimals: PrecisionPolicy,
    #[serde(default)]
    pub activity: ActivityKind,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub pair: Option<String>,
    #[serde(default)]
    pub pair_flip: bool,
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
    /// Member id used for role changes; defaults to the bot's own id.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub client_id: Option<String>,
    #[serde(default = "default_true")]
    pub crypto: bool,
    #[serde(rename = "discord_bot_token")]
    pub token: Secret,
    #[serde(rename = "twelve_data_key", default)]
    pub api_key: Secret,
    #[serde(default)]
    pub api: QuoteApi,
    /// Append `%` to the formatted price (yields, percentages).
    #[serde(default)]
    pub is_percent: bool,
}

fn default_currency() -> String {
    BASE_CURRENCY.to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_multiplier() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn empty_as_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

impl InstrumentConfig {
    /// Reads, parses and validates one instrument source.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::Config`] naming the file if it cannot be read,
    /// is not valid JSON for this shape, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TickerError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&contents)
            .map_err(|e| TickerError::Config(format!("{}: {e}", path.display())))
    }

    /// Parses and validates an instrument from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::Json`] for malformed input and
    /// [`TickerError::Config`] when a required value is unusable.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TickerError::Config("name must not be empty".to_string()));
        }
        if self.token.is_empty() {
            return Err(TickerError::Config(
                "discord_bot_token must not be empty".to_string(),
            ));
        }
        if self.frequency == 0 {
            return Err(TickerError::Config(
                "frequency must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Deterministic bot username, lower-cased and clamped to the platform limit.
    pub fn label(&self) -> String {
        let subject = if self.crypto {
            self.name.as_str()
        } else {
            self.ticker.as_deref().unwrap_or(&self.name)
        };
        format!("{subject}-{}", self.currency)
            .to_lowercase()
            .chars()
            .take(MAX_LABEL_LEN)
            .collect()
    }

    pub fn provider_kind(&self) -> ProviderKind {
        match (self.crypto, self.api) {
            (false, _) => ProviderKind::Yahoo,
            (true, QuoteApi::CoinGecko) => ProviderKind::CoinGecko,
            (true, QuoteApi::Pony) => ProviderKind::Pony,
        }
    }

    /// Identifier handed to the quote provider on every tick.
    pub fn quote_id(&self) -> &str {
        match self.provider_kind() {
            ProviderKind::Pony => self.ticker.as_deref().unwrap_or(&self.name),
            ProviderKind::CoinGecko | ProviderKind::Yahoo => &self.name,
        }
    }

    /// Configured multiplier as a float; a configured zero counts as one.
    pub fn base_multiplier(&self) -> f64 {
        f64::from(self.multiplier.max(1))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.frequency)
    }
}

/// Lists the live instrument sources in `dir`, sorted by file name.
///
/// Only regular `*.json` files count; [`SAMPLE_FILE`] is skipped.
///
/// # Errors
///
/// Returns [`TickerError::Io`] if the directory cannot be listed.
pub fn discover_instruments(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let is_sample = path.file_name().is_some_and(|name| name == SAMPLE_FILE);
        if is_json && !is_sample {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
