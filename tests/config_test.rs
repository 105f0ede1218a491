//! Instrument configuration loading tests.

mod common;

use common::{fixtures_dir, instrument};
use serde_json::json;
use ticker_bots::TickerError;
use ticker_bots::config::{ActivityKind, InstrumentConfig, ProviderKind, discover_instruments};
use ticker_bots::format::PrecisionPolicy;

#[test]
fn test_full_instrument_loads_from_file() {
    let config = InstrumentConfig::load(&fixtures_dir().join("bitcoin.json")).unwrap();

    assert_eq!(config.name, "bitcoin");
    assert_eq!(config.ticker.as_deref(), Some("BTC"));
    assert!(config.nickname);
    assert!(config.color);
    assert_eq!(config.frequency, 30);
    assert_eq!(config.decimals, PrecisionPolicy::Auto);
    assert_eq!(config.activity, ActivityKind::Change);
    assert_eq!(config.pair, None);
    assert_eq!(config.client_id, None);
    assert_eq!(config.token.expose(), "bot-token");
    assert!(config.api_key.is_empty());
    assert_eq!(config.provider_kind(), ProviderKind::CoinGecko);
    assert_eq!(config.quote_id(), "bitcoin");
    assert_eq!(config.label(), "bitcoin-usd");
}

#[test]
fn test_pony_instrument_uses_ticker_as_quote_id() {
    let config = InstrumentConfig::load(&fixtures_dir().join("pony_nav.json")).unwrap();

    assert_eq!(config.provider_kind(), ProviderKind::Pony);
    assert_eq!(config.quote_id(), "NAV");
    assert_eq!(config.decimals, PrecisionPolicy::Fixed(4));
    assert_eq!(config.currency, "USD");
    assert_eq!(config.currency_symbol, "$");
}

#[test]
fn test_equity_instrument_uses_yahoo_and_ticker_label() {
    let config = instrument(json!({ "crypto": false, "name": "apple", "ticker": "AAPL" }));

    assert_eq!(config.provider_kind(), ProviderKind::Yahoo);
    assert_eq!(config.label(), "aapl-usd");
}

#[test]
fn test_missing_token_names_the_file() {
    let path = fixtures_dir().join("missing_token.json");

    let err = InstrumentConfig::load(&path).unwrap_err();

    assert!(matches!(err, TickerError::Config(_)));
    assert!(err.to_string().contains("missing_token.json"));
}

#[test]
fn test_missing_file_is_a_config_error() {
    let err = InstrumentConfig::load(&fixtures_dir().join("nonexistent.json")).unwrap_err();

    assert!(matches!(err, TickerError::Config(_)));
}

#[test]
fn test_token_is_redacted_in_debug_output() {
    let config = instrument(json!({}));

    let debug = format!("{config:?}");

    assert!(!debug.contains("bot-token"));
    assert!(debug.contains("Secret(***)"));
}

#[test]
fn test_discovery_excludes_non_json_and_sample() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["sample.json", "zeta.json", "alpha.json", "readme.md"] {
        std::fs::write(dir.path().join(name), "{}").unwrap();
    }
    std::fs::create_dir(dir.path().join("nested.json")).unwrap();

    let paths = discover_instruments(dir.path()).unwrap();

    let names: Vec<_> = paths
        .iter()
        .filter_map(|p| p.file_name()?.to_str())
        .collect();
    assert_eq!(names, vec!["alpha.json", "zeta.json"]);
}
