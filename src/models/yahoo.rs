//! Yahoo Finance `quoteSummary` response models (the `price` module only).

use serde::Deserialize;

use super::Quote;
use crate::{Result, TickerError};

/// Body of `GET /v10/finance/quoteSummary/{symbol}?modules=price`.
#[derive(Debug, Deserialize)]
pub struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    pub quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
pub struct QuoteSummary {
    #[serde(default)]
    pub result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryResult {
    pub price: PriceModule,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceModule {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub regular_market_price: RawValue,
    #[serde(default)]
    pub regular_market_change: RawValue,
    /// Fraction, not percent.
    #[serde(default)]
    pub regular_market_change_percent: RawValue,
    #[serde(default)]
    pub market_cap: RawValue,
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`, or `{}` when unknown.
#[derive(Debug, Default, Deserialize)]
pub struct RawValue {
    #[serde(default)]
    pub raw: Option<f64>,
}

impl QuoteSummaryResponse {
    /// Normalizes the first result into a [`Quote`].
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::QuoteFetch`] for an empty result set or a
    /// result without a market price.
    pub fn into_quote(self, requested: &str) -> Result<Quote> {
        let first = self
            .quote_summary
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| TickerError::QuoteFetch(format!("{requested}: empty result set")))?;
        let price = first.price;
        let market_price = price.regular_market_price.raw.ok_or_else(|| {
            TickerError::QuoteFetch(format!("{requested}: missing regularMarketPrice"))
        })?;

        Ok(Quote {
            id: requested.to_string(),
            symbol: price.symbol.unwrap_or_else(|| requested.to_string()),
            price: market_price,
            change: price.regular_market_change.raw,
            change_percent: price.regular_market_change_percent.raw.map(|f| f * 100.0),
            market_cap: price.market_cap.raw.unwrap_or_default(),
        })
    }
}
