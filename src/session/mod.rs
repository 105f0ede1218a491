//! Chat platform session.
//!
//! The engine only talks to the platform through [`Session`], so tests can
//! substitute a recording fake. [`DiscordSession`] is the real thing:
//! - [`rest`] - users, guilds, nicknames and roles over HTTP
//! - [`gateway`] - one WebSocket per shard, carrying presence updates

pub mod gateway;
pub mod rest;

use async_trait::async_trait;

use crate::Result;
use crate::models::StatusKind;
use crate::models::discord::{CurrentUser, Guild, Role};

pub use rest::DiscordSession;

/// Number of guilds requested when listing memberships.
pub const GUILD_LIMIT: u32 = 100;

/// Everything a ticker engine needs from the chat platform.
#[async_trait]
pub trait Session: Send + Sync {
    /// Number of gateway shards the platform recommends for this bot.
    async fn shard_count(&self) -> Result<u32>;

    /// Opens the gateway connection for `shard` out of `shard_count`.
    async fn open_shard(&self, shard: u32, shard_count: u32) -> Result<()>;

    /// Closes the gateway connection for `shard`, if open.
    async fn close_shard(&self, shard: u32) -> Result<()>;

    async fn current_user(&self) -> Result<CurrentUser>;

    async fn update_username(&self, name: &str) -> Result<()>;

    async fn list_guilds(&self, limit: u32) -> Result<Vec<Guild>>;

    /// Sets the bot's own nickname in a guild.
    async fn update_nickname(&self, guild_id: &str, nickname: &str) -> Result<()>;

    /// Replaces the status line shown on `shard`.
    async fn update_status(&self, shard: u32, activity: &str, kind: StatusKind) -> Result<()>;

    async fn list_roles(&self, guild_id: &str) -> Result<Vec<Role>>;

    async fn add_role(&self, guild_id: &str, member_id: &str, role_id: &str) -> Result<()>;

    async fn remove_role(&self, guild_id: &str, member_id: &str, role_id: &str) -> Result<()>;
}
