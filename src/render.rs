//! Presence rendering.
//!
//! Turns one tick's inputs into the nickname and status line pushed to the
//! platform. Rendering is pure: the same inputs always give the same
//! [`RenderedPresence`].

use crate::config::{ActivityKind, InstrumentConfig};
use crate::format::{format_amount, format_figure, format_price, format_ratio};
use crate::models::{Quote, RenderedPresence, StatusKind};

/// Absolute changes below this are shown as a percent only.
const MIN_CHANGE: f64 = 0.01;

/// State of the paired instrument for this tick.
#[derive(Debug, Clone, Copy)]
pub enum PairQuote<'a> {
    /// No pair configured.
    NotConfigured,
    /// A pair is configured but its quote could not be fetched.
    Unavailable,
    Available(&'a Quote),
}

/// Formats `price` under the instrument's precision and percent settings.
pub fn display_price(config: &InstrumentConfig, price: f64) -> String {
    let mut formatted = format_price(price, &config.currency_symbol, config.decimals);
    if config.is_percent {
        formatted.push('%');
    }
    formatted
}

/// The ticker override if configured, else the quote's symbol upper-cased.
pub fn display_name(config: &InstrumentConfig, quote: &Quote) -> String {
    config
        .ticker
        .clone()
        .unwrap_or_else(|| quote.symbol.to_uppercase())
}

/// Renders the presence for one tick.
///
/// `price` is the already formatted price and `decorator` the glyph or
/// configured decorator in effect after classifying this tick's change.
pub fn render(
    config: &InstrumentConfig,
    quote: &Quote,
    price: &str,
    decorator: &str,
    pair: PairQuote<'_>,
) -> RenderedPresence {
    if !config.nickname {
        return RenderedPresence {
            nickname: None,
            activity: format!("{price} {decorator} {}%", percent_figure(quote)),
            kind: StatusKind::Playing,
        };
    }

    let name = display_name(config, quote);
    let nickname = if name == decorator {
        price.to_string()
    } else {
        format!("{}{name}{decorator} {price}", config.name_prefix)
    };

    let activity = match pair {
        PairQuote::Available(pair_quote) => {
            cross_rate(&name, quote, pair_quote, config.pair_flip)
        }
        PairQuote::Unavailable => change_summary(quote),
        PairQuote::NotConfigured if config.activity == ActivityKind::MarketCap => {
            format!("{} TVL", format_amount(quote.market_cap))
        }
        PairQuote::NotConfigured => change_activity(quote),
    };

    RenderedPresence {
        nickname: Some(nickname),
        activity,
        kind: StatusKind::Watching,
    }
}

/// `<ratio> BASE/QUOTE`, oriented by `flip`.
fn cross_rate(name: &str, quote: &Quote, pair: &Quote, flip: bool) -> String {
    let pair_name = pair.symbol.to_uppercase();
    let (ratio, label) = if flip {
        (pair.price / quote.price, format!("{pair_name}/{name}"))
    } else {
        (quote.price / pair.price, format!("{name}/{pair_name}"))
    };
    format!("{} {label}", format_ratio(ratio))
}

/// `change (percent%)`, or whichever part the provider supplied.
pub fn change_summary(quote: &Quote) -> String {
    match (quote.change, quote.change_percent) {
        (Some(change), Some(percent)) => {
            format!("{} ({}%)", format_figure(change), format_figure(percent))
        }
        (Some(change), None) => format_figure(change),
        (None, Some(_)) => percent_only(quote),
        (None, None) => String::new(),
    }
}

/// Like [`change_summary`], but drops sub-cent changes.
fn change_activity(quote: &Quote) -> String {
    match quote.change {
        Some(change) if change.abs() >= MIN_CHANGE => change_summary(quote),
        _ => percent_only(quote),
    }
}

fn percent_only(quote: &Quote) -> String {
    quote
        .change_percent
        .map(|percent| format!("{}%", format_figure(percent)))
        .unwrap_or_default()
}

fn percent_figure(quote: &Quote) -> String {
    quote.change_percent.map(format_figure).unwrap_or_default()
}
