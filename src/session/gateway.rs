//! Gateway WebSocket connection for a single shard.
//!
//! A shard connection identifies, then hands the socket to a manager task
//! that heartbeats, tracks sequence numbers and reconnects with exponential
//! backoff whenever the gateway drops the session. The engine only ever
//! writes presence updates to it.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use tungstenite::Message;

use crate::config::Secret;
use crate::models::StatusKind;
use crate::models::discord::{GatewayCommand, GatewayEvent, Hello, opcode};
use crate::{Result, TickerError};

/// Gateway protocol version and encoding appended to the gateway URL.
const GATEWAY_QUERY: &str = "?v=10&encoding=json";

/// Initial backoff duration between reconnection attempts.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum backoff duration between reconnection attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Write half of a gateway connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a gateway connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Writer slot shared with the manager task; empty while reconnecting.
type SharedWriter = Arc<Mutex<Option<WsWriter>>>;

/// Why a gateway session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DisconnectReason {
    /// The gateway asked for a reconnect (op 7).
    Reconnect,
    /// The gateway invalidated the session (op 9).
    InvalidSession,
    /// The previous heartbeat was never acknowledged.
    MissedAck,
    /// Close frame, read error or end of stream.
    ConnectionLost,
}

/// An identified gateway connection that keeps itself alive.
#[derive(Debug)]
pub struct ShardConnection {
    shard: u32,
    writer: SharedWriter,
    manager: JoinHandle<()>,
}

impl ShardConnection {
    /// Connects to `gateway_url`, waits for `Hello` and identifies.
    ///
    /// Only this first handshake is reported to the caller. Later sessions
    /// are re-established in the background.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::WebSocket`] if the connection fails and
    /// [`TickerError::Session`] if the gateway does not greet with a valid
    /// `Hello`.
    pub async fn connect(
        gateway_url: &str,
        token: &str,
        shard: u32,
        shard_count: u32,
    ) -> Result<Self> {
        let url = format!("{}/{GATEWAY_QUERY}", gateway_url.trim_end_matches('/'));
        let (write, read, period) = handshake(&url, token, shard, shard_count).await?;

        let writer = Arc::new(Mutex::new(Some(write)));
        let manager = ShardManager {
            url,
            token: Secret::from(token.to_string()),
            shard,
            shard_count,
            writer: writer.clone(),
        };
        let manager = tokio::spawn(manager.run(read, period));

        Ok(Self {
            shard,
            writer,
            manager,
        })
    }

    /// Sends a presence update with a single online activity.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::Push`] while the shard is reconnecting, or
    /// the write error if the frame cannot be sent.
    pub async fn send_presence(&self, activity: &str, kind: StatusKind) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let Some(write) = writer.as_mut() else {
            return Err(TickerError::Push(format!(
                "shard {} is reconnecting",
                self.shard
            )));
        };
        send_json(write, &GatewayCommand::presence(activity, kind)).await?;
        debug!(shard = self.shard, activity, "Sent presence update");
        Ok(())
    }

    /// Stops the manager task and closes the socket.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::WebSocket`] if the close frame cannot be sent.
    pub async fn close(&self) -> Result<()> {
        self.manager.abort();
        let current = self.writer.lock().await.take();
        if let Some(mut write) = current {
            // Closing the sink sends the close frame.
            write.close().await?;
        }
        info!(shard = self.shard, "Gateway connection closed");
        Ok(())
    }
}

/// Owns the read half and re-establishes the session when it ends.
struct ShardManager {
    url: String,
    token: Secret,
    shard: u32,
    shard_count: u32,
    writer: SharedWriter,
}

impl ShardManager {
    /// Serves the current session, then reconnects forever.
    ///
    /// A requested reconnect is retried immediately; every other
    /// disconnect backs off first.
    async fn run(self, mut read: WsReader, mut period: Duration) {
        let shard = self.shard;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            let reason = self.read_loop(read, period).await;
            let stale = self.writer.lock().await.take();
            if let Some(mut write) = stale {
                let _ = write.close().await;
            }

            if reason == DisconnectReason::Reconnect {
                info!(shard, "Gateway requested a reconnect");
            } else {
                warn!(
                    shard,
                    ?reason,
                    backoff_secs = backoff.as_secs(),
                    "Gateway session lost, backing off"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }

            (read, period) = loop {
                match handshake(&self.url, self.token.expose(), shard, self.shard_count).await {
                    Ok((write, read, period)) => {
                        *self.writer.lock().await = Some(write);
                        break (read, period);
                    }
                    Err(e) => {
                        error!(shard, "Reconnect failed: {e}");
                        info!(shard, backoff_secs = backoff.as_secs(), "Backing off before retry");
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            };
            backoff = INITIAL_BACKOFF;
            info!(shard, "Gateway session re-identified");
        }
    }

    /// Reads frames and heartbeats every `period` until the session ends.
    async fn read_loop(&self, mut read: WsReader, period: Duration) -> DisconnectReason {
        let shard = self.shard;
        let mut sequence = None;
        let mut acked = true;
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if !acked {
                        return DisconnectReason::MissedAck;
                    }
                    if let Err(e) = self.send(&GatewayCommand::heartbeat(sequence)).await {
                        warn!(shard, "Heartbeat failed: {e}");
                        return DisconnectReason::ConnectionLost;
                    }
                    acked = false;
                }
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        let event = match serde_json::from_str::<GatewayEvent>(&text) {
                            Ok(event) => event,
                            Err(e) => {
                                warn!(shard, "Unparsable gateway frame: {e}");
                                continue;
                            }
                        };
                        if let Some(seq) = event.s {
                            sequence = Some(seq);
                        }
                        match event.op {
                            opcode::DISPATCH => {
                                debug!(shard, event = event.t.as_deref().unwrap_or(""), "Dispatch");
                            }
                            opcode::HEARTBEAT_ACK => acked = true,
                            opcode::HEARTBEAT => {
                                if let Err(e) = self.send(&GatewayCommand::heartbeat(sequence)).await {
                                    warn!(shard, "Heartbeat failed: {e}");
                                    return DisconnectReason::ConnectionLost;
                                }
                            }
                            opcode::RECONNECT => return DisconnectReason::Reconnect,
                            opcode::INVALID_SESSION => return DisconnectReason::InvalidSession,
                            other => debug!(shard, op = other, "Gateway frame"),
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        warn!(shard, "Gateway closed the connection: {frame:?}");
                        return DisconnectReason::ConnectionLost;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(shard, "Gateway error: {e}");
                        return DisconnectReason::ConnectionLost;
                    }
                    None => return DisconnectReason::ConnectionLost,
                },
            }
        }
    }

    async fn send<T: Serialize>(&self, payload: &T) -> Result<()> {
        match self.writer.lock().await.as_mut() {
            Some(write) => send_json(write, payload).await,
            None => Err(TickerError::Session(format!(
                "shard {} has no open socket",
                self.shard
            ))),
        }
    }
}

/// Opens a socket, reads `Hello` and identifies. Returns both halves and
/// the heartbeat period.
async fn handshake(
    url: &str,
    token: &str,
    shard: u32,
    shard_count: u32,
) -> Result<(WsWriter, WsReader, Duration)> {
    let (ws_stream, _) = connect_async(url).await?;
    let (mut write, mut read) = ws_stream.split();
    info!(shard, shard_count, "Gateway handshake completed");

    let hello = read_hello(&mut read).await?;
    send_json(&mut write, &GatewayCommand::identify(token, shard, shard_count)).await?;
    debug!(shard, "Sent identify");

    Ok((write, read, Duration::from_millis(hello.heartbeat_interval)))
}

async fn send_json<T: Serialize>(write: &mut WsWriter, payload: &T) -> Result<()> {
    let json = serde_json::to_string(payload)?;
    write.send(Message::Text(json.into())).await?;
    Ok(())
}

/// Reads frames until the first text frame, which must be `Hello` with a
/// non-zero heartbeat interval.
async fn read_hello(read: &mut WsReader) -> Result<Hello> {
    while let Some(msg) = read.next().await {
        match msg? {
            Message::Text(text) => {
                let event: GatewayEvent = serde_json::from_str(&text)?;
                if event.op != opcode::HELLO {
                    return Err(TickerError::Session(format!(
                        "expected hello, gateway sent op {}",
                        event.op
                    )));
                }
                let hello: Hello = serde_json::from_value(event.d)?;
                if hello.heartbeat_interval == 0 {
                    return Err(TickerError::Session(
                        "gateway sent a zero heartbeat interval".to_string(),
                    ));
                }
                return Ok(hello);
            }
            Message::Close(frame) => {
                return Err(TickerError::Session(format!(
                    "gateway closed before hello: {frame:?}"
                )));
            }
            _ => {}
        }
    }
    Err(TickerError::Session(
        "gateway stream ended before hello".to_string(),
    ))
}
