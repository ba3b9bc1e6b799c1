use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const FE_PREFIX: &str = "FE_";
pub const BE_PREFIX: &str = "BE_";

pub const FE_JOIN_BOARD: &str = "FE_JOIN_BOARD";
pub const FE_LEAVE_BOARD: &str = "FE_LEAVE_BOARD";
pub const PING: &str = "PING";
pub const PONG: &str = "PONG";

pub const BE_CONNECTED: &str = "BE_CONNECTED";
pub const BE_JOINED_BOARD: &str = "BE_JOINED_BOARD";
pub const BE_LEFT_BOARD: &str = "BE_LEFT_BOARD";
pub const BE_ERROR: &str = "BE_ERROR";
pub const BE_USER_INVITED_TO_BOARD: &str = "BE_USER_INVITED_TO_BOARD";

/// Frame sent by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEvent {
    pub event: String,
    #[serde(default)]
    pub board_id: Option<Uuid>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Frame pushed to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_id: Option<Uuid>,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_user_id: Option<Uuid>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ServerEvent {
    pub fn new(event: impl Into<String>, board_id: Option<Uuid>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            board_id,
            data,
            from_user_id: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn from_user(mut self, user_id: Uuid) -> Self {
        self.from_user_id = Some(user_id);
        self
    }

    pub fn error(message: impl Into<String>, board_id: Option<Uuid>) -> Self {
        Self::new(
            BE_ERROR,
            board_id,
            serde_json::json!({ "message": message.into() }),
        )
    }
}

/// What the connection loop should do with one incoming frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Join(Uuid),
    Leave(Uuid),
    Ping,
    Relay {
        event: String,
        board_id: Uuid,
        data: serde_json::Value,
    },
}

/// `FE_[A-Z][A-Z0-9_]*`
pub fn is_client_event_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix(FE_PREFIX) else {
        return false;
    };
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// `FE_CARD_UPDATED` -> `BE_CARD_UPDATED`
pub fn relay_event_name(name: &str) -> Option<String> {
    if !is_client_event_name(name) {
        return None;
    }
    name.strip_prefix(FE_PREFIX)
        .map(|rest| format!("{}{}", BE_PREFIX, rest))
}

pub fn parse_client_frame(text: &str) -> Result<ClientCommand, String> {
    let frame: ClientEvent =
        serde_json::from_str(text).map_err(|e| format!("Invalid message format: {}", e))?;

    // board_id may also arrive inside data
    let board_id = frame.board_id.or_else(|| {
        frame
            .data
            .get("board_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
    });

    match frame.event.as_str() {
        PING => Ok(ClientCommand::Ping),
        FE_JOIN_BOARD => board_id
            .map(ClientCommand::Join)
            .ok_or_else(|| "board_id is required".to_string()),
        FE_LEAVE_BOARD => board_id
            .map(ClientCommand::Leave)
            .ok_or_else(|| "board_id is required".to_string()),
        other => {
            let event = relay_event_name(other)
                .ok_or_else(|| format!("Unsupported event: {}", other))?;
            let board_id = board_id.ok_or_else(|| "board_id is required".to_string())?;
            Ok(ClientCommand::Relay {
                event,
                board_id,
                data: frame.data,
            })
        }
    }
}
