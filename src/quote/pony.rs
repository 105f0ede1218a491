//! Pony Finance protocol figures provider.

use async_trait::async_trait;
use reqwest::Client;

use super::{QuoteProvider, check_status};
use crate::models::Quote;
use crate::models::pony::{InfoResponse, ProtocolFigures};
use crate::{Result, TickerError};

const PROVIDER: &str = "pony";

/// Reads `GET {base}/info` and exposes one figure as the price.
///
/// The instrument names the figure: `NAV`, `APY` or `TVL`. The protocol
/// publishes no change data, so quotes carry none.
pub struct PonyClient {
    http: Client,
    base_url: String,
}

impl PonyClient {
    #[must_use]
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl QuoteProvider for PonyClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, instrument: &str) -> Result<Quote> {
        let url = format!("{}/info", self.base_url);
        let response = check_status(self.http.get(&url).send().await?, PROVIDER)?;
        let info: InfoResponse = response.json().await?;
        let figures = ProtocolFigures::from(info);

        let price = match instrument.to_ascii_uppercase().as_str() {
            "NAV" => figures.net_asset_value,
            "APY" => figures.annual_percentage_yield,
            "TVL" => figures.total_value_locked,
            other => {
                return Err(TickerError::QuoteFetch(format!(
                    "pony has no figure named {other:?}"
                )));
            }
        };

        Ok(Quote {
            id: instrument.to_string(),
            symbol: PROVIDER.to_string(),
            price,
            change: None,
            change_percent: None,
            market_cap: figures.total_value_locked,
        })
    }
}
