//! CoinGecko `/coins/{id}` response models.

use serde::Deserialize;

use super::Quote;
use crate::{Result, TickerError};

/// Body of `GET /coins/{id}`.
#[derive(Debug, Deserialize)]
pub struct CoinResponse {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub market_data: MarketData,
}

/// The `market_data` block. CoinGecko emits `null` for figures it lacks.
#[derive(Debug, Deserialize)]
pub struct MarketData {
    pub current_price: CurrencyValues,
    #[serde(default)]
    pub market_cap: CurrencyValues,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub price_change_24h_in_currency: CurrencyValues,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
}

/// A figure denominated in the two currencies we read.
#[derive(Debug, Default, Deserialize)]
pub struct CurrencyValues {
    #[serde(default)]
    pub usd: Option<f64>,
    #[serde(default)]
    pub btc: Option<f64>,
}

impl TryFrom<CoinResponse> for Quote {
    type Error = TickerError;

    fn try_from(coin: CoinResponse) -> Result<Self> {
        let data = coin.market_data;
        let price = data
            .current_price
            .usd
            .ok_or_else(|| TickerError::QuoteFetch(format!("{} has no usd price", coin.id)))?;

        Ok(Quote {
            id: coin.id,
            symbol: coin.symbol,
            price,
            change: data.price_change_24h_in_currency.usd,
            change_percent: data.price_change_percentage_24h,
            market_cap: data.market_cap.usd.unwrap_or_default(),
        })
    }
}
