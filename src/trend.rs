//! Trend classification and the decorator shown next to a price.

use crate::format::format_figure;

/// Glyph shown while the latest change is non-negative.
pub const UP_GLYPH: &str = "⬈";

/// Glyph shown while the latest change is negative.
pub const DOWN_GLYPH: &str = "⬊";

/// Direction of the latest 24h change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trend {
    pub increase: bool,
}

impl Trend {
    /// Glyph an auto decorator switches to for this trend.
    pub fn glyph(self) -> &'static str {
        if self.increase { UP_GLYPH } else { DOWN_GLYPH }
    }
}

/// Classifies a change value by the sign of its two-digit rendering.
///
/// A change that renders with a leading `-` (including `-0.00`) is a
/// decrease; zero, positive and absent changes are an increase.
pub fn classify(change: Option<f64>) -> Trend {
    let increase = match change {
        Some(value) => !format_figure(value).starts_with('-'),
        None => true,
    };
    Trend { increase }
}

/// The decorator an engine renders with, kept across ticks.
///
/// In auto mode the glyph follows the latest successfully fetched change and
/// stays put when a tick is skipped. A configured decorator never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decorator {
    /// Arrow glyph; empty until the first successful tick.
    Auto(&'static str),
    /// Configured verbatim.
    Fixed(String),
}

impl Decorator {
    /// Auto mode for an empty configured value, fixed otherwise.
    pub fn from_config(configured: &str) -> Self {
        if configured.is_empty() {
            Self::Auto("")
        } else {
            Self::Fixed(configured.to_string())
        }
    }

    /// Records the trend of a fresh sample; a no-op for fixed decorators.
    pub fn observe(&mut self, trend: Trend) {
        if let Self::Auto(glyph) = self {
            *glyph = trend.glyph();
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Auto(glyph) => glyph,
            Self::Fixed(text) => text,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto(_))
    }
}
