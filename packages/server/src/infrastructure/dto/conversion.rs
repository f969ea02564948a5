//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    entity,
    notification::{DispatchReport, EventType},
    value_object::{AssignmentId, RoomKey, UserKey},
};
use crate::infrastructure::dto::{http, websocket as ws};

// ========================================
// DTO → Domain Entity
// ========================================

impl From<http::NotificationEventDto> for entity::NotificationEvent {
    fn from(dto: http::NotificationEventDto) -> Self {
        Self {
            event_type: EventType::from_code(&dto.event_type),
            assignment_id: AssignmentId::new(dto.assignment_id),
            // 空文字の recipient は「指定なし」として扱う
            recipient: dto.recipient.and_then(|raw| UserKey::new(raw).ok()),
            recipient_type: dto.recipient_type,
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl ws::ChatBroadcast {
    pub fn from_domain(room_key: &RoomKey, message: &entity::ChatMessage) -> Self {
        Self {
            room_id: message.room_id.value(),
            message_id: message.message_id.value(),
            room_key: room_key.as_str().to_string(),
            sender_id: message.sender.as_str().to_string(),
            sender_display_name: message.sender_display_name.clone(),
            content: message.content.as_str().to_string(),
            sent_at: message.sent_at.value(),
        }
    }
}

impl From<DispatchReport> for http::DispatchReportDto {
    fn from(report: DispatchReport) -> Self {
        Self {
            events: report.events,
            skipped_events: report.skipped_events,
            logged: report.logged,
            log_failures: report.log_failures,
            live_deliveries: report.live_deliveries,
            pushed: report.pushed,
            push_failures: report.push_failures,
            duplicates_skipped: report.duplicates_skipped,
        }
    }
}
