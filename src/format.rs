//! Price and amount formatting.
//!
//! Everything here is pure and total over `f64`: zero, negative and
//! non-finite inputs format without panicking.

use serde::{Deserialize, Deserializer};

/// Largest fixed number of fractional digits a config may request.
pub const MAX_FIXED_DIGITS: u8 = 13;

/// Suffix used when a sub-cent price is shown in cents.
pub const CENTS_GLYPH: char = '¢';

/// How many fractional digits a price is rendered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrecisionPolicy {
    /// Exactly this many digits, `0..=13`.
    Fixed(u8),
    /// Tiered by magnitude, see [`format_price`].
    #[default]
    Auto,
}

impl PrecisionPolicy {
    /// Maps a raw `decimals` value; anything outside `0..=13` means auto.
    pub fn from_digits(digits: i64) -> Self {
        match u8::try_from(digits) {
            Ok(d) if d <= MAX_FIXED_DIGITS => Self::Fixed(d),
            _ => Self::Auto,
        }
    }
}

impl<'de> Deserialize<'de> for PrecisionPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Digits(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Digits(d) => Ok(Self::from_digits(d)),
            Raw::Text(text) if text.eq_ignore_ascii_case("auto") => Ok(Self::Auto),
            Raw::Text(text) => text
                .trim()
                .parse::<i64>()
                .map(Self::from_digits)
                .map_err(|_| serde::de::Error::custom(format!("invalid decimals {text:?}"))),
        }
    }
}

/// Formats a price for display.
///
/// With [`PrecisionPolicy::Auto`]:
/// - below `0.01` the value is shown in cents with 8 digits (when the cent
///   value is below `0.00001`) or 6 digits, suffixed by `¢` and without the
///   currency symbol
/// - below `1.0` it gets 3 digits
/// - otherwise 2 digits
pub fn format_price(price: f64, currency_symbol: &str, precision: PrecisionPolicy) -> String {
    match precision {
        PrecisionPolicy::Fixed(digits) => {
            format!("{currency_symbol}{price:.prec$}", prec = usize::from(digits))
        }
        PrecisionPolicy::Auto if price < 0.01 => {
            let cents = price * 100.0;
            if cents < 0.00001 {
                format!("{cents:.8}{CENTS_GLYPH}")
            } else {
                format!("{cents:.6}{CENTS_GLYPH}")
            }
        }
        PrecisionPolicy::Auto if price < 1.0 => format!("{currency_symbol}{price:.3}"),
        PrecisionPolicy::Auto => format!("{currency_symbol}{price:.2}"),
    }
}

/// Two-digit rendering shared by change and percent figures.
pub fn format_figure(value: f64) -> String {
    format!("{value:.2}")
}

/// Formats a cross rate with 4 digits below `0.1`, otherwise 2.
pub fn format_ratio(ratio: f64) -> String {
    if ratio < 0.1 {
        format!("{ratio:.4}")
    } else {
        format!("{ratio:.2}")
    }
}

/// Formats a large amount with a thousands scale suffix.
///
/// Values above a billion, a million and a hundred thousand are divided down
/// and suffixed `B`, `M` and `K`. The result always has 2 fractional digits
/// and comma thousands separators.
pub fn format_amount(value: f64) -> String {
    let (scaled, suffix) = if value > 1_000_000_000.0 {
        (value / 1_000_000_000.0, "B")
    } else if value > 1_000_000.0 {
        (value / 1_000_000.0, "M")
    } else if value > 100_000.0 {
        (value / 1_000.0, "K")
    } else {
        (value, "")
    };

    format!("{}{suffix}", group_thousands(&format!("{scaled:.2}")))
}

/// Inserts `,` between groups of three integer digits of a decimal string.
fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };
    if !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return number.to_string();
    }

    let mut grouped = String::with_capacity(number.len() + int_part.len() / 3);
    grouped.push_str(sign);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fraction_digits(formatted: &str) -> usize {
        let digits = formatted.trim_end_matches(CENTS_GLYPH).trim_end_matches('%');
        digits.split_once('.').map_or(0, |(_, frac)| frac.len())
    }

    #[test]
    fn auto_prices_above_one_get_two_digits() {
        for price in [1.0, 1.5, 45123.456, 1_000_000.0] {
            let out = format_price(price, "$", PrecisionPolicy::Auto);
            assert!(out.starts_with('$'), "{out}");
            assert_eq!(fraction_digits(&out), 2, "{out}");
        }
        assert_eq!(format_price(45123.456, "$", PrecisionPolicy::Auto), "$45123.46");
    }

    #[test]
    fn auto_prices_below_one_get_three_digits() {
        for price in [0.01, 0.5, 0.999] {
            let out = format_price(price, "€", PrecisionPolicy::Auto);
            assert!(out.starts_with('€'), "{out}");
            assert_eq!(fraction_digits(&out), 3, "{out}");
        }
        assert_eq!(format_price(0.5, "$", PrecisionPolicy::Auto), "$0.500");
    }

    #[test]
    fn auto_sub_cent_prices_switch_to_cents() {
        let out = format_price(0.005, "$", PrecisionPolicy::Auto);
        assert_eq!(out, "0.500000¢");

        let tiny = format_price(0.00000001, "$", PrecisionPolicy::Auto);
        assert!(!tiny.contains('$'));
        assert!(tiny.ends_with(CENTS_GLYPH));
        assert_eq!(fraction_digits(&tiny), 8);
    }

    #[test]
    fn auto_handles_zero_and_negative_prices() {
        assert_eq!(format_price(0.0, "$", PrecisionPolicy::Auto), "0.00000000¢");
        let negative = format_price(-2.0, "$", PrecisionPolicy::Auto);
        assert!(negative.starts_with('-'));
        assert!(negative.ends_with(CENTS_GLYPH));
    }

    #[test]
    fn fixed_precision_ignores_magnitude() {
        for digits in 0..=MAX_FIXED_DIGITS {
            for price in [0.000001, 0.5, 42.0, 98765.4321] {
                let out = format_price(price, "$", PrecisionPolicy::Fixed(digits));
                assert!(out.starts_with('$'));
                assert_eq!(fraction_digits(&out), usize::from(digits), "{out}");
            }
        }
        assert_eq!(format_price(42.0, "$", PrecisionPolicy::Fixed(0)), "$42");
    }

    #[test]
    fn precision_from_digits_range() {
        assert_eq!(PrecisionPolicy::from_digits(0), PrecisionPolicy::Fixed(0));
        assert_eq!(PrecisionPolicy::from_digits(13), PrecisionPolicy::Fixed(13));
        assert_eq!(PrecisionPolicy::from_digits(14), PrecisionPolicy::Auto);
        assert_eq!(PrecisionPolicy::from_digits(-1), PrecisionPolicy::Auto);
    }

    #[test]
    fn precision_deserializes_numbers_and_auto() {
        let fixed: PrecisionPolicy = serde_json::from_str("4").unwrap();
        assert_eq!(fixed, PrecisionPolicy::Fixed(4));
        let auto: PrecisionPolicy = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(auto, PrecisionPolicy::Auto);
        let sentinel: PrecisionPolicy = serde_json::from_str("-1").unwrap();
        assert_eq!(sentinel, PrecisionPolicy::Auto);
        assert!(serde_json::from_str::<PrecisionPolicy>("\"lots\"").is_err());
    }

    #[test]
    fn amounts_scale_with_suffixes() {
        assert_eq!(format_amount(1_500_000_000.0), "1.50B");
        assert_eq!(format_amount(250_000.0), "250.00K");
        assert_eq!(format_amount(999.0), "999.00");
        assert_eq!(format_amount(2_345_678.0), "2.35M");
    }

    #[test]
    fn amounts_on_a_boundary_use_the_lower_scale() {
        assert_eq!(format_amount(1_000_000_000.0), "1,000.00M");
        assert_eq!(format_amount(100_000.0), "100,000.00");
    }

    #[test]
    fn grouping_keeps_sign_and_fraction() {
        assert_eq!(group_thousands("-1234567.89"), "-1,234,567.89");
        assert_eq!(group_thousands("12.00"), "12.00");
        assert_eq!(group_thousands("NaN"), "NaN");
    }

    #[test]
    fn ratios_widen_below_a_tenth() {
        assert_eq!(format_ratio(0.0512345), "0.0512");
        assert_eq!(format_ratio(15.456), "15.46");
    }
}
