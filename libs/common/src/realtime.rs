//! Row change notifications
//!
//! The platform pushes table changes over a Phoenix channel websocket. A
//! `Subscription` joins `realtime:<table>`, keeps the socket alive with
//! heartbeats and forwards each change as a `ChangeEvent` on an mpsc channel.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};

use crate::error::{PlatformError, PlatformResult};
use crate::platform::PlatformClient;

/// Interval between keep-alive messages on an open channel
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

const CHANNEL_CAPACITY: usize = 64;

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row change on a watched table
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    pub record: Value,
    pub old_record: Value,
}

/// Frame exchanged on the channel socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub topic: String,
    pub event: String,
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl ChannelMessage {
    /// Join the change topic of `table`
    pub fn join(table: &str, access_token: Option<&str>, reference: u64) -> Self {
        let mut payload = json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": table }
                ]
            }
        });
        if let Some(token) = access_token {
            payload["access_token"] = Value::String(token.to_string());
        }

        Self {
            topic: topic(table),
            event: "phx_join".to_string(),
            payload,
            reference: Some(reference.to_string()),
        }
    }

    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: "phoenix".to_string(),
            event: "heartbeat".to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn leave(table: &str, reference: u64) -> Self {
        Self {
            topic: topic(table),
            event: "phx_leave".to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    /// The row change carried by this frame, if any
    pub fn change(&self) -> Option<ChangeEvent> {
        if self.event != "postgres_changes" {
            return None;
        }

        let data = self.payload.get("data")?;
        let kind: ChangeKind = serde_json::from_value(data.get("type")?.clone()).ok()?;
        let table = data.get("table")?.as_str()?.to_string();

        Some(ChangeEvent {
            table,
            kind,
            record: data.get("record").cloned().unwrap_or(Value::Null),
            old_record: data.get("old_record").cloned().unwrap_or(Value::Null),
        })
    }

    /// Status of a `phx_reply`, e.g. `"ok"` or `"error"`
    pub fn reply_status(&self) -> Option<&str> {
        if self.event != "phx_reply" {
            return None;
        }
        self.payload.get("status")?.as_str()
    }
}

fn topic(table: &str) -> String {
    format!("realtime:{}", table)
}

/// Live subscription to one table's changes
///
/// Dropping it without calling `unsubscribe` still stops the socket task.
pub struct Subscription {
    table: String,
    events: mpsc::Receiver<ChangeEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Subscription fed by an arbitrary channel, used by in-process feeds
    pub fn from_receiver(table: &str, events: mpsc::Receiver<ChangeEvent>) -> Self {
        Self {
            table: table.to_string(),
            events,
            shutdown: None,
            task: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Next change, or `None` once the channel is closed
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Leave the channel and wait for the socket task to finish
    pub async fn unsubscribe(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Realtime task for {} ended abnormally: {}", self.table, e);
            }
        }
        info!("Unsubscribed from {} changes", self.table);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Source of table change notifications
#[automock]
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self, table: &str) -> PlatformResult<Subscription>;
}

/// `ChangeFeed` backed by the platform's websocket endpoint
#[derive(Clone, Debug)]
pub struct RealtimeClient {
    platform: PlatformClient,
}

impl RealtimeClient {
    pub fn new(platform: PlatformClient) -> Self {
        Self { platform }
    }

    /// Websocket URL derived from the project URL
    pub fn socket_url(&self) -> String {
        let base = self.platform.base_url();
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };

        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base,
            self.platform.anon_key()
        )
    }
}

#[async_trait]
impl ChangeFeed for RealtimeClient {
    async fn subscribe(&self, table: &str) -> PlatformResult<Subscription> {
        let (mut stream, _) = connect_async(self.socket_url())
            .await
            .map_err(|e| PlatformError::Realtime(format!("Failed to connect: {}", e)))?;

        let access_token = self.platform.access_token();
        let join = ChannelMessage::join(table, access_token.as_deref(), 1);
        stream
            .send(Message::Text(serde_json::to_string(&join)?.into()))
            .await
            .map_err(|e| PlatformError::Realtime(format!("Failed to join {}: {}", table, e)))?;

        info!("Subscribed to {} changes", table);

        let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_channel(
            stream,
            table.to_string(),
            events_tx,
            shutdown_rx,
        ));

        Ok(Subscription {
            table: table.to_string(),
            events: events_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

type Socket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn run_channel(
    stream: Socket,
    table: String,
    events: mpsc::Sender<ChangeEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let (mut write, mut read) = stream.split();
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut reference: u64 = 1;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                reference += 1;
                if let Ok(text) = serde_json::to_string(&ChannelMessage::leave(&table, reference)) {
                    let _ = write.send(Message::Text(text.into())).await;
                }
                let _ = write.close().await;
                break;
            }
            _ = heartbeat.tick() => {
                reference += 1;
                let Ok(text) = serde_json::to_string(&ChannelMessage::heartbeat(reference)) else {
                    continue;
                };
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    error!("Realtime heartbeat for {} failed: {}", table, e);
                    break;
                }
            }
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let message: ChannelMessage = match serde_json::from_str(&text) {
                        Ok(message) => message,
                        Err(e) => {
                            warn!("Ignoring malformed realtime frame: {}", e);
                            continue;
                        }
                    };

                    if let Some(status) = message.reply_status() {
                        info!("Realtime subscription status for {}: {}", table, status);
                    } else if let Some(change) = message.change() {
                        if events.send(change).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    warn!("Realtime channel for {} closed", table);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("Realtime channel for {} failed: {}", table, e);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;

    #[test]
    fn test_join_frame() {
        let join = ChannelMessage::join("visits", Some("token"), 1);
        let encoded = serde_json::to_value(&join).unwrap();

        assert_eq!(encoded["topic"], "realtime:visits");
        assert_eq!(encoded["event"], "phx_join");
        assert_eq!(encoded["ref"], "1");
        assert_eq!(encoded["payload"]["access_token"], "token");
        assert_eq!(
            encoded["payload"]["config"]["postgres_changes"][0],
            json!({ "event": "*", "schema": "public", "table": "visits" })
        );
    }

    #[test]
    fn test_heartbeat_and_leave_frames() {
        let heartbeat = serde_json::to_value(ChannelMessage::heartbeat(7)).unwrap();
        assert_eq!(heartbeat["topic"], "phoenix");
        assert_eq!(heartbeat["event"], "heartbeat");

        let leave = ChannelMessage::leave("visits", 8);
        assert_eq!(leave.topic, "realtime:visits");
        assert_eq!(leave.event, "phx_leave");
    }

    #[test]
    fn test_change_is_extracted() {
        let frame = r#"{
            "topic": "realtime:visits",
            "event": "postgres_changes",
            "payload": {
                "ids": [1],
                "data": {
                    "type": "UPDATE",
                    "schema": "public",
                    "table": "visits",
                    "record": {"id": "v1", "status": "approved"},
                    "old_record": {"id": "v1"}
                }
            },
            "ref": null
        }"#;
        let message: ChannelMessage = serde_json::from_str(frame).unwrap();
        let change = message.change().unwrap();

        assert_eq!(change.table, "visits");
        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.record["status"], "approved");
        assert_eq!(change.old_record["id"], "v1");
    }

    #[test]
    fn test_reply_is_not_a_change() {
        let frame = r#"{"topic":"realtime:visits","event":"phx_reply","payload":{"status":"ok","response":{}},"ref":"1"}"#;
        let message: ChannelMessage = serde_json::from_str(frame).unwrap();

        assert!(message.change().is_none());
        assert_eq!(message.reply_status(), Some("ok"));
    }

    #[test]
    fn test_socket_url() {
        let platform = PlatformClient::new(&PlatformConfig {
            url: "https://project.example.co".to_string(),
            anon_key: "anon".to_string(),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            RealtimeClient::new(platform).socket_url(),
            "wss://project.example.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
        );
    }

    #[tokio::test]
    async fn test_subscription_from_receiver() {
        let (tx, rx) = mpsc::channel(1);
        let mut subscription = Subscription::from_receiver("visits", rx);
        tx.send(ChangeEvent {
            table: "visits".to_string(),
            kind: ChangeKind::Insert,
            record: json!({"id": "v1"}),
            old_record: Value::Null,
        })
        .await
        .unwrap();
        drop(tx);

        assert_eq!(subscription.table(), "visits");
        assert_eq!(subscription.recv().await.unwrap().kind, ChangeKind::Insert);
        assert!(subscription.recv().await.is_none());
        subscription.unsubscribe().await;
    }
}
