//! JSON text frames for the in-session transport.

use crate::domain::{
    AssignmentId, ChatMessage, FrameFormatter, NotificationContent, RoomKey, UserKey,
};

use super::websocket::{ChatBroadcast, ServerMessage};

/// `FrameFormatter` producing the tagged `ServerMessage` JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFrameFormatter;

impl FrameFormatter for JsonFrameFormatter {
    fn chat(&self, room_key: &RoomKey, message: &ChatMessage) -> Option<String> {
        ServerMessage::Chat(ChatBroadcast::from_domain(room_key, message)).to_json()
    }

    fn coordinates(&self, sender: Option<&UserKey>, payload: serde_json::Value) -> Option<String> {
        ServerMessage::Coordinates {
            sender: sender.map(|s| s.to_string()),
            payload,
        }
        .to_json()
    }

    fn notification(
        &self,
        notification_type: &str,
        assignment_id: Option<AssignmentId>,
        content: &NotificationContent,
    ) -> Option<String> {
        ServerMessage::Notification {
            title: content.title.clone(),
            body: content.body.clone(),
            notification_type: notification_type.to_string(),
            assignment_id: assignment_id.map(|id| id.value()),
        }
        .to_json()
    }
}
