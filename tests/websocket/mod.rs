pub mod basic_tests;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message as TungsteniteMessage,
};
use url::Url;
use uuid::Uuid;

pub type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Settings for tests that talk to a running server.
/// `TEST_ACCESS_TOKEN` must belong to an active user who is a member of `TEST_BOARD_ID`.
pub struct TestConfig {
    pub websocket_url: String,
    pub access_token: String,
    pub board_id: Option<Uuid>,
    pub timeout_duration: Duration,
}

impl TestConfig {
    pub fn from_env() -> Self {
        Self {
            websocket_url: std::env::var("TEST_WEBSOCKET_URL")
                .unwrap_or_else(|_| "ws://127.0.0.1:8017/ws".to_string()),
            access_token: std::env::var("TEST_ACCESS_TOKEN").unwrap_or_default(),
            board_id: std::env::var("TEST_BOARD_ID")
                .ok()
                .and_then(|id| Uuid::parse_str(&id).ok()),
            timeout_duration: Duration::from_secs(5),
        }
    }

    pub fn url_with_token(&self, token: &str) -> Url {
        let mut url = Url::parse(&self.websocket_url).expect("invalid websocket url");
        url.query_pairs_mut().append_pair("token", token);
        url
    }
}

pub async fn connect(config: &TestConfig) -> TestSocket {
    let (socket, _) = connect_async(config.url_with_token(&config.access_token))
        .await
        .expect("failed to connect");
    socket
}

pub async fn send_frame(socket: &mut TestSocket, event: &str, board_id: Option<Uuid>, data: serde_json::Value) {
    let frame = json!({ "event": event, "board_id": board_id, "data": data });
    socket
        .send(TungsteniteMessage::Text(frame.to_string()))
        .await
        .expect("failed to send frame");
}

/// Reads frames until one with the given event name arrives.
pub async fn wait_for_event(socket: &mut TestSocket, event: &str, limit: Duration) -> Option<serde_json::Value> {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        let remaining = deadline.checked_duration_since(tokio::time::Instant::now())?;
        match timeout(remaining, socket.next()).await {
            Ok(Some(Ok(TungsteniteMessage::Text(text)))) => {
                let value: serde_json::Value = serde_json::from_str(&text).ok()?;
                if value["event"] == event {
                    return Some(value);
                }
            }
            Ok(Some(Ok(_))) => continue,
            _ => return None,
        }
    }
}
