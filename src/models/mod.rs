//! Domain types shared by the engine plus the wire models of every
//! external service.
//!
//! - [`gecko`], [`pony`], [`yahoo`] - quote provider responses
//! - [`discord`] - chat platform REST and gateway payloads

pub mod discord;
pub mod gecko;
pub mod pony;
pub mod yahoo;

/// A priced sample, normalized from whichever provider served it.
///
/// Lives for a single tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Provider-side identifier the quote was requested with.
    pub id: String,
    /// Display symbol as reported by the provider (e.g. `btc`).
    pub symbol: String,
    pub price: f64,
    /// 24h absolute change; `None` when the provider has no change data.
    pub change: Option<f64>,
    /// 24h change in percent.
    pub change_percent: Option<f64>,
    pub market_cap: f64,
}

impl Quote {
    /// Rescales the currency-denominated figures into the display currency.
    #[must_use]
    pub fn converted(mut self, multiplier: f64) -> Self {
        self.price *= multiplier;
        self.change = self.change.map(|change| change * multiplier);
        self
    }
}

/// How the platform labels a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Rendered as "Playing …".
    Playing,
    /// Rendered as "Watching …".
    Watching,
}

impl StatusKind {
    /// Returns the gateway activity type code.
    pub fn activity_type(self) -> u8 {
        match self {
            Self::Playing => 0,
            Self::Watching => 3,
        }
    }
}

/// Output of one tick, pushed to the session straight away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPresence {
    /// Guild nickname; `None` outside nickname mode.
    pub nickname: Option<String>,
    pub activity: String,
    pub kind: StatusKind,
}
