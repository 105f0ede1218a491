//! Market data providers.
//!
//! Every provider implements [`QuoteProvider`] and normalizes its own
//! schema into a [`Quote`]:
//! - [`gecko`] - CoinGecko coin details (crypto instruments)
//! - [`pony`] - Pony Finance protocol figures (NAV, APY, TVL)
//! - [`yahoo`] - Yahoo Finance quote summaries (equities, FX pairs)

mod gecko;
mod pony;
mod yahoo;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, StatusCode};

use crate::config::{Endpoints, InstrumentConfig, ProviderKind};
use crate::models::Quote;
use crate::{Result, TickerError};

pub use gecko::CoinGeckoClient;
pub use pony::PonyClient;
pub use yahoo::YahooClient;

/// A source of priced quotes.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Fetches the latest quote for `instrument`.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::RateLimited`] when throttled and
    /// [`TickerError::QuoteFetch`] or [`TickerError::Http`] for any other
    /// failure.
    async fn fetch(&self, instrument: &str) -> Result<Quote>;
}

/// Builds the HTTP client shared by all providers.
///
/// # Errors
///
/// Returns [`TickerError::Http`] if the client cannot be constructed.
pub fn http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Ok(Client::builder().default_headers(headers).build()?)
}

/// Picks the provider serving `config`'s instrument.
pub fn provider_for(
    config: &InstrumentConfig,
    endpoints: &Endpoints,
    http: &Client,
) -> Arc<dyn QuoteProvider> {
    match config.provider_kind() {
        ProviderKind::CoinGecko => {
            let key = (!config.api_key.is_empty()).then(|| config.api_key.clone());
            Arc::new(CoinGeckoClient::new(http.clone(), &endpoints.coingecko, key))
        }
        ProviderKind::Pony => Arc::new(PonyClient::new(http.clone(), &endpoints.pony)),
        ProviderKind::Yahoo => Arc::new(YahooClient::new(http.clone(), &endpoints.yahoo)),
    }
}

/// Provider used to resolve `<CODE>=X` exchange rates.
pub fn exchange_rates(endpoints: &Endpoints, http: &Client) -> Arc<dyn QuoteProvider> {
    Arc::new(YahooClient::new(http.clone(), &endpoints.yahoo))
}

/// Maps throttling and non-success statuses to quote errors.
fn check_status(response: Response, provider: &'static str) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TickerError::RateLimited { provider });
    }
    if !status.is_success() {
        return Err(TickerError::QuoteFetch(format!(
            "{provider} returned {status}"
        )));
    }
    Ok(response)
}
