//! セッション内に送るフレームの組み立て（trait のみ）
//!
//! ワイヤー形式（JSON の `type` タグなど）は infrastructure 層の DTO が決める。
//! UseCase はこの trait 経由で組み立て済みの文字列を受け取り、`MessagePusher` に渡す。

use super::{
    entity::ChatMessage,
    notification::NotificationContent,
    value_object::{AssignmentId, RoomKey, UserKey},
};

/// フレームの組み立て
///
/// シリアライズに失敗した場合は `None`（実装側でログに残す）。
pub trait FrameFormatter: Send + Sync {
    /// ルーム内へブロードキャストするチャットメッセージ
    fn chat(&self, room_key: &RoomKey, message: &ChatMessage) -> Option<String>;

    /// 観測者へ中継する位置座標（payload は加工しない）
    fn coordinates(&self, sender: Option<&UserKey>, payload: serde_json::Value) -> Option<String>;

    /// セッション内で配信する通知
    fn notification(
        &self,
        notification_type: &str,
        assignment_id: Option<AssignmentId>,
        content: &NotificationContent,
    ) -> Option<String>;
}
