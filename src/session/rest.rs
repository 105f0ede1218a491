//! Discord session backed by the v10 REST API and one gateway connection
//! per shard.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::Session;
use super::gateway::ShardConnection;
use crate::config::Secret;
use crate::models::StatusKind;
use crate::models::discord::{
    CurrentUser, GatewayBot, Guild, ModifyCurrentMember, ModifyCurrentUser, Role,
};
use crate::{Result, TickerError};

/// A logged-in bot: REST calls plus the shard connections opened so far.
pub struct DiscordSession {
    http: Client,
    api_url: String,
    token: Secret,
    gateway_url: Mutex<Option<String>>,
    shards: Mutex<HashMap<u32, Arc<ShardConnection>>>,
}

impl DiscordSession {
    #[must_use]
    pub fn new(http: Client, api_url: &str, token: Secret) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            gateway_url: Mutex::new(None),
            shards: Mutex::new(HashMap::new()),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.api_url))
            .header(AUTHORIZATION, format!("Bot {}", self.token.expose()))
    }

    async fn gateway_bot(&self) -> Result<GatewayBot> {
        let response = self.request(Method::GET, "/gateway/bot").send().await?;
        let bot: GatewayBot = checked(response, TickerError::Session).await?.json().await?;
        *self.gateway_url.lock().await = Some(bot.url.clone());
        Ok(bot)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(Method::GET, path).send().await?;
        Ok(checked(response, TickerError::Session).await?.json().await?)
    }

    /// Sends a write and discards the body.
    async fn push(&self, request: RequestBuilder) -> Result<()> {
        checked(request.send().await?, TickerError::Push).await?;
        Ok(())
    }
}

/// Turns a non-success response into `kind` carrying status and body.
async fn checked(response: Response, kind: fn(String) -> TickerError) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(kind(format!("{url} returned {status}: {body}")))
}

#[async_trait]
impl Session for DiscordSession {
    async fn shard_count(&self) -> Result<u32> {
        let bot = self.gateway_bot().await?;
        info!(shards = bot.shards, "Gateway recommends shard count");
        Ok(bot.shards.max(1))
    }

    async fn open_shard(&self, shard: u32, shard_count: u32) -> Result<()> {
        let cached = self.gateway_url.lock().await.clone();
        let url = match cached {
            Some(url) => url,
            None => self.gateway_bot().await?.url,
        };

        let connection =
            ShardConnection::connect(&url, self.token.expose(), shard, shard_count).await?;
        self.shards.lock().await.insert(shard, Arc::new(connection));
        Ok(())
    }

    async fn close_shard(&self, shard: u32) -> Result<()> {
        let Some(connection) = self.shards.lock().await.remove(&shard) else {
            debug!(shard, "Shard was not open");
            return Ok(());
        };
        connection.close().await
    }

    async fn current_user(&self) -> Result<CurrentUser> {
        self.get("/users/@me").await
    }

    async fn update_username(&self, name: &str) -> Result<()> {
        let body = ModifyCurrentUser { username: name };
        self.push(self.request(Method::PATCH, "/users/@me").json(&body))
            .await
    }

    async fn list_guilds(&self, limit: u32) -> Result<Vec<Guild>> {
        self.get(&format!("/users/@me/guilds?limit={limit}")).await
    }

    async fn update_nickname(&self, guild_id: &str, nickname: &str) -> Result<()> {
        let body = ModifyCurrentMember { nick: nickname };
        let path = format!("/guilds/{guild_id}/members/@me");
        self.push(self.request(Method::PATCH, &path).json(&body))
            .await
    }

    async fn update_status(&self, shard: u32, activity: &str, kind: StatusKind) -> Result<()> {
        let connection = self.shards.lock().await.get(&shard).cloned();
        match connection {
            Some(connection) => connection.send_presence(activity, kind).await,
            None => Err(TickerError::Push(format!("shard {shard} is not open"))),
        }
    }

    async fn list_roles(&self, guild_id: &str) -> Result<Vec<Role>> {
        self.get(&format!("/guilds/{guild_id}/roles")).await
    }

    async fn add_role(&self, guild_id: &str, member_id: &str, role_id: &str) -> Result<()> {
        let path = format!("/guilds/{guild_id}/members/{member_id}/roles/{role_id}");
        self.push(self.request(Method::PUT, &path)).await
    }

    async fn remove_role(&self, guild_id: &str, member_id: &str, role_id: &str) -> Result<()> {
        let path = format!("/guilds/{guild_id}/members/{member_id}/roles/{role_id}");
        self.push(self.request(Method::DELETE, &path)).await
    }
}
