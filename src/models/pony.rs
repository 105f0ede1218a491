//! Pony Finance `/info` response models.

use serde::Deserialize;
use tracing::warn;

/// Body of `GET /info`; every figure arrives as a string.
#[derive(Debug, Deserialize)]
pub struct InfoResponse {
    #[serde(default)]
    pub tvl: String,
    #[serde(default)]
    pub apy: String,
    #[serde(default)]
    pub nav: String,
}

/// Parsed protocol figures.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProtocolFigures {
    pub total_value_locked: f64,
    pub annual_percentage_yield: f64,
    pub net_asset_value: f64,
}

impl From<InfoResponse> for ProtocolFigures {
    /// Unparsable figures are logged and read as zero.
    fn from(info: InfoResponse) -> Self {
        Self {
            total_value_locked: parse_figure("tvl", &info.tvl),
            annual_percentage_yield: parse_figure("apy", &info.apy),
            net_asset_value: parse_figure("nav", &info.nav),
        }
    }
}

fn parse_figure(field: &str, raw: &str) -> f64 {
    raw.trim().parse().unwrap_or_else(|e| {
        warn!(field, value = raw, "Failed to parse pony figure: {e}");
        0.0
    })
}
