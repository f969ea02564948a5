//! Entity 定義

use serde::Serialize;

use super::{
    notification::{Channel, EventType, RecipientType},
    value_object::{AssignmentId, MessageContent, MessageId, RoomId, RoomKey, Timestamp, UserKey},
};

/// 会話コンテキスト（例: 契約者と配車担当の間のチャット）
///
/// 最初のメッセージで作成され、以降はメッセージのたびに `last_activity_at` が更新される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRoom {
    pub id: RoomId,
    pub key: RoomKey,
    pub participant_types: Vec<RecipientType>,
    pub last_activity_at: Timestamp,
}

impl ChatRoom {
    pub fn new(id: RoomId, key: RoomKey, created_at: Timestamp) -> Self {
        Self {
            id,
            key,
            participant_types: Vec::new(),
            last_activity_at: created_at,
        }
    }

    /// 最終アクティビティを更新（時刻が巻き戻る更新は無視）
    pub fn touch(&mut self, at: Timestamp) {
        if at > self.last_activity_at {
            self.last_activity_at = at;
        }
    }
}

/// 永続化済みのチャットメッセージ（追記のみ・不変）
///
/// 並び順は `(room_id, sent_at, message_id)`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub message_id: MessageId,
    pub sender: UserKey,
    pub sender_display_name: String,
    pub content: MessageContent,
    pub sent_at: Timestamp,
}

impl ChatMessage {
    pub fn ordering_key(&self) -> (RoomId, Timestamp, MessageId) {
        (self.room_id, self.sent_at, self.message_id)
    }
}

/// 永続化の結果として返る ID の組
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedMessage {
    pub room_id: RoomId,
    pub message_id: MessageId,
}

/// 業務レイヤーが生成する通知イベント（永続化しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub event_type: EventType,
    pub assignment_id: AssignmentId,
    /// 通知先ユーザー。`None` の場合は業務レイヤーが解決した全員が対象
    pub recipient: Option<UserKey>,
    pub recipient_type: RecipientType,
}

/// 通知の監査ログ（追記のみ）
///
/// 1 イベント × 受信者 × チャネルにつき 1 件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationLogEntry {
    pub user_key: UserKey,
    /// チャット通知の場合は `None`
    pub assignment_id: Option<AssignmentId>,
    pub title: String,
    pub body: String,
    pub notification_type: String,
    pub channel: Channel,
    pub sent_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_room_touch_never_moves_backwards() {
        // テスト項目: last_activity_at は過去の時刻で上書きされない
        // given (前提条件):
        let mut room = ChatRoom::new(
            RoomId::new(5),
            RoomKey::new("R5".to_string()).unwrap(),
            Timestamp::new(1_000),
        );

        // when (操作):
        room.touch(Timestamp::new(2_000));
        room.touch(Timestamp::new(1_500));

        // then (期待する結果):
        assert_eq!(room.last_activity_at, Timestamp::new(2_000));
    }
}
