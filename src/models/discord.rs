//! Discord REST resources and gateway payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StatusKind;

/// Gateway opcodes used by a presence-only bot.
pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const PRESENCE_UPDATE: u8 = 3;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// Response to `GET /gateway/bot`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayBot {
    pub url: String,
    pub shards: u32,
}

/// The bot's own user, from `GET /users/@me`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
}

/// A guild the bot is a member of.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Guild {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

/// Body of `PATCH /users/@me`.
#[derive(Debug, Serialize)]
pub struct ModifyCurrentUser<'a> {
    pub username: &'a str,
}

/// Body of `PATCH /guilds/{id}/members/@me`.
#[derive(Debug, Serialize)]
pub struct ModifyCurrentMember<'a> {
    pub nick: &'a str,
}

/// Any frame received from the gateway.
#[derive(Debug, Deserialize)]
pub struct GatewayEvent {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

/// Payload of the `Hello` frame.
#[derive(Debug, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

/// A frame sent to the gateway.
#[derive(Debug, Serialize)]
pub struct GatewayCommand<T> {
    pub op: u8,
    pub d: T,
}

/// `Identify` payload for one shard.
#[derive(Debug, Serialize)]
pub struct Identify<'a> {
    pub token: &'a str,
    pub intents: u64,
    pub properties: ConnectionProperties,
    pub shard: [u32; 2],
}

#[derive(Debug, Serialize)]
pub struct ConnectionProperties {
    pub os: &'static str,
    pub browser: &'static str,
    pub device: &'static str,
}

/// `Presence Update` payload.
#[derive(Debug, Serialize)]
pub struct PresenceUpdate {
    pub since: Option<u64>,
    pub activities: Vec<Activity>,
    pub status: &'static str,
    pub afk: bool,
}

#[derive(Debug, Serialize)]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
}

impl<'a> GatewayCommand<Identify<'a>> {
    /// Identifies as shard `shard` of `shard_count` without any intents.
    pub fn identify(token: &'a str, shard: u32, shard_count: u32) -> Self {
        Self {
            op: opcode::IDENTIFY,
            d: Identify {
                token,
                intents: 0,
                properties: ConnectionProperties {
                    os: std::env::consts::OS,
                    browser: env!("CARGO_PKG_NAME"),
                    device: env!("CARGO_PKG_NAME"),
                },
                shard: [shard, shard_count],
            },
        }
    }
}

impl GatewayCommand<Option<u64>> {
    /// Heartbeat carrying the last sequence number seen.
    pub fn heartbeat(sequence: Option<u64>) -> Self {
        Self {
            op: opcode::HEARTBEAT,
            d: sequence,
        }
    }
}

impl GatewayCommand<PresenceUpdate> {
    /// Sets a single online activity.
    pub fn presence(activity: &str, kind: StatusKind) -> Self {
        Self {
            op: opcode::PRESENCE_UPDATE,
            d: PresenceUpdate {
                since: None,
                activities: vec![Activity {
                    name: activity.to_string(),
                    kind: kind.activity_type(),
                }],
                status: "online",
                afk: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identify_serializes_shard_pair() {
        let json = serde_json::to_value(GatewayCommand::identify("secret", 1, 4)).unwrap();
        assert_eq!(json["op"], 2);
        assert_eq!(json["d"]["token"], "secret");
        assert_eq!(json["d"]["intents"], 0);
        assert_eq!(json["d"]["shard"][0], 1);
        assert_eq!(json["d"]["shard"][1], 4);
    }

    #[test]
    fn presence_serializes_watching_activity() {
        let json =
            serde_json::to_value(GatewayCommand::presence("-1.20 (-0.5%)", StatusKind::Watching))
                .unwrap();
        assert_eq!(json["op"], 3);
        assert_eq!(json["d"]["status"], "online");
        assert_eq!(json["d"]["since"], Value::Null);
        assert_eq!(json["d"]["activities"][0]["name"], "-1.20 (-0.5%)");
        assert_eq!(json["d"]["activities"][0]["type"], 3);
    }

    #[test]
    fn heartbeat_carries_sequence_or_null() {
        let first = serde_json::to_value(GatewayCommand::heartbeat(None)).unwrap();
        assert_eq!(first["d"], Value::Null);
        let later = serde_json::to_value(GatewayCommand::heartbeat(Some(42))).unwrap();
        assert_eq!(later["op"], 1);
        assert_eq!(later["d"], 42);
    }

    #[test]
    fn hello_event_parses() {
        let event: GatewayEvent =
            serde_json::from_str(r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#)
                .unwrap();
        assert_eq!(event.op, opcode::HELLO);
        let hello: Hello = serde_json::from_value(event.d).unwrap();
        assert_eq!(hello.heartbeat_interval, 41250);
    }
}
