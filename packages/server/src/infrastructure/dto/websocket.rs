//! WebSocket message DTOs.
//!
//! All frames are JSON text frames tagged by `type` (snake_case).

use serde::{Deserialize, Serialize};

/// Frames sent by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinRoom {
        room_id: String,
    },
    LeaveRoom {
        room_id: String,
    },
    SendMessage {
        #[serde(default)]
        room_id: String,
        content: String,
        #[serde(default)]
        sender_display_name: Option<String>,
    },
    SendCoordinates {
        observer_keys: Vec<String>,
        payload: serde_json::Value,
    },
}

/// Chat message broadcast to every connection in the room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBroadcast {
    pub room_id: i64,
    pub message_id: i64,
    pub room_key: String,
    pub sender_id: String,
    pub sender_display_name: String,
    pub content: String,
    /// Unix timestamp (milliseconds)
    pub sent_at: i64,
}

/// Frames sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        connection_id: String,
        user_key: Option<String>,
    },
    RoomJoined {
        room_id: String,
    },
    RoomLeft {
        room_id: String,
    },
    Chat(ChatBroadcast),
    Coordinates {
        sender: Option<String>,
        payload: serde_json::Value,
    },
    Notification {
        title: String,
        body: String,
        notification_type: String,
        assignment_id: Option<i64>,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// JSON 文字列に変換（失敗はログに残して `None`）
    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!("Failed to serialize server message: {}", e);
                None
            }
        }
    }
}
