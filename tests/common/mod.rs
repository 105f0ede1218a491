//! Shared test doubles: a recording chat session and scripted quote
//! providers.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use ticker_bots::config::InstrumentConfig;
use ticker_bots::models::StatusKind;
use ticker_bots::models::discord::{CurrentUser, Guild, Role};
use ticker_bots::models::Quote;
use ticker_bots::quote::QuoteProvider;
use ticker_bots::session::Session;
use ticker_bots::{Result, TickerError};

/// Path to the JSON fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Reads a fixture into a string.
pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join(name)).expect("fixture should exist")
}

/// Builds an instrument from the `bitcoin.json` fixture with `overrides`
/// merged over it.
pub fn instrument(overrides: serde_json::Value) -> InstrumentConfig {
    let mut base: serde_json::Value =
        serde_json::from_str(&fixture("bitcoin.json")).expect("fixture is valid JSON");
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
        for (key, value) in overrides {
            base.insert(key.clone(), value.clone());
        }
    }
    InstrumentConfig::from_json(&base.to_string()).expect("instrument should be valid")
}

pub fn quote(symbol: &str, price: f64, change: Option<f64>, percent: Option<f64>) -> Quote {
    Quote {
        id: symbol.to_string(),
        symbol: symbol.to_string(),
        price,
        change,
        change_percent: percent,
        market_cap: 850_000_000_000.0,
    }
}

pub fn guild(id: &str) -> Guild {
    Guild {
        id: id.to_string(),
        name: format!("guild {id}"),
    }
}

pub fn role(id: &str, name: &str) -> Role {
    Role {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// One call made against [`FakeSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ShardCount,
    OpenShard(u32),
    CloseShard(u32),
    CurrentUser,
    UpdateUsername(String),
    ListGuilds,
    UpdateNickname {
        guild: String,
        nickname: String,
    },
    UpdateStatus {
        shard: u32,
        activity: String,
        kind: StatusKind,
    },
    ListRoles(String),
    AddRole {
        guild: String,
        member: String,
        role: String,
    },
    RemoveRole {
        guild: String,
        member: String,
        role: String,
    },
}

/// A session that records every call and fails where told to.
pub struct FakeSession {
    pub shards: u32,
    pub guilds: Vec<Guild>,
    pub roles: Vec<Role>,
    pub user: CurrentUser,
    pub failing_shard: Option<u32>,
    pub fail_guild_list: bool,
    pub failing_nickname_guild: Option<String>,
    pub fail_role_writes: bool,
    pub stall_role_list: bool,
    pub calls: Mutex<Vec<Call>>,
}

impl Default for FakeSession {
    fn default() -> Self {
        Self {
            shards: 1,
            guilds: vec![guild("g1")],
            roles: vec![role("r-red", "tickers-red"), role("r-green", "tickers-green")],
            user: CurrentUser {
                id: "bot-1".to_string(),
                username: "old-name".to_string(),
            },
            failing_shard: None,
            fail_guild_list: false,
            failing_nickname_guild: None,
            fail_role_writes: false,
            stall_role_list: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeSession {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn nicknames(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UpdateNickname { guild, nickname } => Some((guild, nickname)),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<(u32, String, StatusKind)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UpdateStatus {
                    shard,
                    activity,
                    kind,
                } => Some((shard, activity, kind)),
                _ => None,
            })
            .collect()
    }

    pub fn closed_shards(&self) -> Vec<u32> {
        let mut closed: Vec<u32> = self
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CloseShard(shard) => Some(shard),
                _ => None,
            })
            .collect();
        closed.sort_unstable();
        closed
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn shard_count(&self) -> Result<u32> {
        self.record(Call::ShardCount);
        Ok(self.shards)
    }

    async fn open_shard(&self, shard: u32, _shard_count: u32) -> Result<()> {
        self.record(Call::OpenShard(shard));
        if self.failing_shard == Some(shard) {
            return Err(TickerError::Session(format!("shard {shard} refused")));
        }
        Ok(())
    }

    async fn close_shard(&self, shard: u32) -> Result<()> {
        self.record(Call::CloseShard(shard));
        Ok(())
    }

    async fn current_user(&self) -> Result<CurrentUser> {
        self.record(Call::CurrentUser);
        Ok(self.user.clone())
    }

    async fn update_username(&self, name: &str) -> Result<()> {
        self.record(Call::UpdateUsername(name.to_string()));
        Ok(())
    }

    async fn list_guilds(&self, _limit: u32) -> Result<Vec<Guild>> {
        self.record(Call::ListGuilds);
        if self.fail_guild_list {
            return Err(TickerError::Session("guilds unavailable".into()));
        }
        Ok(self.guilds.clone())
    }

    async fn update_nickname(&self, guild_id: &str, nickname: &str) -> Result<()> {
        self.record(Call::UpdateNickname {
            guild: guild_id.to_string(),
            nickname: nickname.to_string(),
        });
        if self.failing_nickname_guild.as_deref() == Some(guild_id) {
            return Err(TickerError::Push(format!("missing permissions in {guild_id}")));
        }
        Ok(())
    }

    async fn update_status(&self, shard: u32, activity: &str, kind: StatusKind) -> Result<()> {
        self.record(Call::UpdateStatus {
            shard,
            activity: activity.to_string(),
            kind,
        });
        Ok(())
    }

    async fn list_roles(&self, guild_id: &str) -> Result<Vec<Role>> {
        self.record(Call::ListRoles(guild_id.to_string()));
        if self.stall_role_list {
            std::future::pending::<()>().await;
        }
        Ok(self.roles.clone())
    }

    async fn add_role(&self, guild_id: &str, member_id: &str, role_id: &str) -> Result<()> {
        self.record(Call::AddRole {
            guild: guild_id.to_string(),
            member: member_id.to_string(),
            role: role_id.to_string(),
        });
        if self.fail_role_writes {
            return Err(TickerError::Push("role write rejected".into()));
        }
        Ok(())
    }

    async fn remove_role(&self, guild_id: &str, member_id: &str, role_id: &str) -> Result<()> {
        self.record(Call::RemoveRole {
            guild: guild_id.to_string(),
            member: member_id.to_string(),
            role: role_id.to_string(),
        });
        if self.fail_role_writes {
            return Err(TickerError::Push("role write rejected".into()));
        }
        Ok(())
    }
}

/// A scripted provider reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Quote(Quote),
    RateLimited,
    Fail(&'static str),
}

/// A provider that answers from per-instrument scripts.
///
/// Replies are consumed in order; the last one repeats forever.
#[derive(Default)]
pub struct FakeQuotes {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<String>>,
}

impl FakeQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, instrument: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(instrument.to_string(), replies.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteProvider for FakeQuotes {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch(&self, instrument: &str) -> Result<Quote> {
        self.requests.lock().unwrap().push(instrument.to_string());
        let reply = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(instrument) {
                Some(replies) if replies.len() > 1 => replies.pop_front(),
                Some(replies) => replies.front().cloned(),
                None => None,
            }
        };
        match reply {
            Some(Reply::Quote(quote)) => Ok(quote),
            Some(Reply::RateLimited) => Err(TickerError::RateLimited { provider: "fake" }),
            Some(Reply::Fail(reason)) => Err(TickerError::QuoteFetch(reason.to_string())),
            None => Err(TickerError::QuoteFetch(format!("nothing scripted for {instrument}"))),
        }
    }
}
