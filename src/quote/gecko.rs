//! CoinGecko coin details provider.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{QuoteProvider, check_status};
use crate::Result;
use crate::config::Secret;
use crate::models::Quote;
use crate::models::gecko::CoinResponse;

const PROVIDER: &str = "coingecko";

/// Header carrying a CoinGecko Pro key.
const API_KEY_HEADER: &str = "x-cg-pro-api-key";

/// Reads `GET {base}/coins/{id}`.
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
    api_key: Option<Secret>,
}

impl CoinGeckoClient {
    #[must_use]
    pub fn new(http: Client, base_url: &str, api_key: Option<Secret>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl QuoteProvider for CoinGeckoClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, instrument: &str) -> Result<Quote> {
        let url = format!("{}/coins/{instrument}", self.base_url);
        let mut request = self.http.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.expose());
        }

        let response = check_status(request.send().await?, PROVIDER)?;
        let coin: CoinResponse = response.json().await?;
        debug!(instrument, symbol = %coin.symbol, "Fetched coingecko quote");

        Quote::try_from(coin)
    }
}
