//! Crate-level error types.
//!
//! [`TickerError`] unifies every failure a ticker bot can hit (configuration,
//! chat session, quote fetching, presence pushes) behind a single enum. The
//! variant tells the caller how far the failure is allowed to spread: only
//! [`TickerError::Session`] during startup stops an engine, everything else is
//! contained to a tick, a guild or a shard.

use std::time::Duration;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TickerError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum TickerError {
    /// An instrument source or environment setting is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The chat session or one of its shard connections could not be opened.
    #[error("session error: {0}")]
    Session(String),

    /// A quote provider answered with something other than a usable quote.
    #[error("quote fetch error: {0}")]
    QuoteFetch(String),

    /// A quote provider rejected the request with HTTP 429.
    #[error("rate limited by {provider}")]
    RateLimited { provider: &'static str },

    /// The exchange rate for a display currency could not be resolved.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// The guild is missing the roles used for trend colors.
    #[error("role lookup error: {0}")]
    RoleLookup(String),

    /// A nickname, status or role write was rejected.
    #[error("push error: {0}")]
    Push(String),

    /// An external call did not complete within the configured deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// An HTTP request failed at the transport or status level.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A gateway WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading an instrument source from disk failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TickerError {
    /// Returns `true` for the provider throttling variant.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
