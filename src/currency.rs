//! Display currency conversion.
//!
//! Providers quote in [`BASE_CURRENCY`]. Any other display currency is
//! resolved once, before polling starts, to a multiplier taken from the
//! `<CODE>=X` FX pair. A failed lookup degrades to the base multiplier
//! instead of stopping the bot.

use tracing::{info, warn};

use crate::TickerError;
use crate::config::BASE_CURRENCY;
use crate::quote::QuoteProvider;
use crate::retry::RetryPolicy;

/// Returns the multiplier that turns base-currency figures into `currency`.
///
/// `base_multiplier` is the instrument's configured scale (e.g. quoting per
/// 1000 units) and is applied on top of the exchange rate.
pub async fn resolve_multiplier(
    rates: &dyn QuoteProvider,
    policy: &RetryPolicy,
    currency: &str,
    base_multiplier: f64,
) -> f64 {
    if currency.eq_ignore_ascii_case(BASE_CURRENCY) {
        return base_multiplier;
    }

    let pair = fx_pair(currency);
    info!(currency, pair = %pair, "Resolving exchange rate");

    let rate = policy
        .run("exchange rate", || rates.fetch(&pair))
        .await
        .and_then(|quote| {
            if quote.price.is_finite() && quote.price > 0.0 {
                Ok(quote.price)
            } else {
                Err(TickerError::Conversion(format!(
                    "{pair} returned unusable rate {}",
                    quote.price
                )))
            }
        });

    match rate {
        Ok(rate) => rate * base_multiplier,
        Err(e) => {
            warn!(currency, "Unable to fetch exchange rate, defaulting to {BASE_CURRENCY}: {e}");
            base_multiplier
        }
    }
}

/// Synthetic FX symbol for `currency` against the base currency.
pub fn fx_pair(currency: &str) -> String {
    format!("{}=X", currency.to_ascii_uppercase())
}
