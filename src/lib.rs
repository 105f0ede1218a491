//! Price ticker bots for Discord.
//!
//! Each configured instrument gets its own [`engine::TickerEngine`], which
//! polls a quote provider on a fixed interval and mirrors the latest price
//! into the bot's nickname, status line and trend color role.

pub mod config;
pub mod currency;
pub mod engine;
pub mod error;
pub mod format;
pub mod models;
pub mod quote;
pub mod render;
pub mod retry;
pub mod roles;
pub mod session;
pub mod supervisor;
pub mod tls;
pub mod trend;

pub use error::{Result, TickerError};
