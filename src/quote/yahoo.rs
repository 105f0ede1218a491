//! Yahoo Finance quote summary provider.

use async_trait::async_trait;
use reqwest::Client;

use super::{QuoteProvider, check_status};
use crate::Result;
use crate::models::Quote;
use crate::models::yahoo::QuoteSummaryResponse;

const PROVIDER: &str = "yahoo";

/// Reads `GET {base}/v10/finance/quoteSummary/{symbol}?modules=price`.
pub struct YahooClient {
    http: Client,
    base_url: String,
}

impl YahooClient {
    #[must_use]
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, instrument: &str) -> Result<Quote> {
        let url = format!("{}/v10/finance/quoteSummary/{instrument}", self.base_url);
        let request = self.http.get(&url).query(&[("modules", "price")]);

        let response = check_status(request.send().await?, PROVIDER)?;
        let summary: QuoteSummaryResponse = response.json().await?;

        summary.into_quote(instrument)
    }
}
