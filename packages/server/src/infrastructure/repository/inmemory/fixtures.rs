//! インメモリ Repository の初期データ（JSON ファイル）
//!
//! ```json
//! {
//!   "rooms": [{"room_id": "R5", "participants": [{"user_key": "U2", "channel": "app", "token": "..."}]}],
//!   "assignments": [{"assignment_id": 42, "assignment_type": "transportation", "recipients": []}],
//!   "scheduled": [{"due_at": 0, "event_type": "assignment_reminder", "assignment_id": 42}]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    AssignmentId, AssignmentSummary, EventType, NotificationEvent, PushTarget, RecipientType,
    RoomKey, Timestamp, UserKey,
};

use super::{InMemoryChatRepository, InMemoryNotificationRepository};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixtures: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse fixtures: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub rooms: Vec<RoomFixture>,
    #[serde(default)]
    pub assignments: Vec<AssignmentFixture>,
    #[serde(default)]
    pub scheduled: Vec<ScheduledFixture>,
}

#[derive(Debug, Deserialize)]
pub struct RoomFixture {
    pub room_id: RoomKey,
    #[serde(default)]
    pub participants: Vec<PushTarget>,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentFixture {
    #[serde(flatten)]
    pub summary: AssignmentSummary,
    #[serde(default)]
    pub recipients: Vec<PushTarget>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduledFixture {
    /// Unix timestamp (milliseconds)
    pub due_at: i64,
    pub event_type: EventType,
    pub assignment_id: AssignmentId,
    #[serde(default)]
    pub recipient: Option<UserKey>,
    #[serde(default)]
    pub recipient_type: RecipientType,
}

impl Fixtures {
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, FixtureError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Repository に流し込む
    pub async fn apply(
        self,
        chat_repository: &InMemoryChatRepository,
        notification_repository: &InMemoryNotificationRepository,
    ) {
        let (rooms, assignments, scheduled) =
            (self.rooms.len(), self.assignments.len(), self.scheduled.len());

        for room in self.rooms {
            chat_repository
                .upsert_room(&room.room_id, room.participants)
                .await;
        }
        for assignment in self.assignments {
            notification_repository
                .upsert_assignment(assignment.summary, assignment.recipients)
                .await;
        }
        for item in self.scheduled {
            notification_repository
                .schedule_event(
                    Timestamp::new(item.due_at),
                    NotificationEvent {
                        event_type: item.event_type,
                        assignment_id: item.assignment_id,
                        recipient: item.recipient,
                        recipient_type: item.recipient_type,
                    },
                )
                .await;
        }

        tracing::info!(
            "Loaded fixtures: {} room(s), {} assignment(s), {} scheduled event(s)",
            rooms,
            assignments,
            scheduled
        );
    }
}
