//! Repository trait 定義
//!
//! チャットの永続化・通知先の解決・通知ログの書き込みは業務レイヤー（外部コラボレーター）
//! が担う。ドメイン層は必要なインターフェースだけを定義し、
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::{NotificationEvent, NotificationLogEntry, PersistedMessage},
    error::RepositoryError,
    notification::{AssignmentSummary, EventType, PushTarget},
    value_object::{AssignmentId, MessageContent, RoomId, RoomKey, Timestamp, UserKey},
};

/// チャット永続化の trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// メッセージをトランザクショナルに永続化する
    ///
    /// ChatRoom が存在しなければ作成し、存在すれば最終アクティビティを更新する。
    async fn persist_chat_message(
        &self,
        room_key: &RoomKey,
        sender: &UserKey,
        sender_display_name: &str,
        content: &MessageContent,
        sent_at: Timestamp,
    ) -> Result<PersistedMessage, RepositoryError>;

    /// ルーム参加者のうち `live_user_keys` に含まれないユーザーの通知先を返す
    async fn room_participants_minus_live(
        &self,
        room_id: RoomId,
        live_user_keys: Vec<UserKey>,
    ) -> Result<Vec<PushTarget>, RepositoryError>;
}

/// 通知の解決・監査ログの trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 文面の組み立てに使うアサインメント情報を取得
    async fn load_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Option<AssignmentSummary>, RepositoryError>;

    /// イベントの通知対象（ユーザー・チャネル・トークン）を解決
    async fn resolve_recipients_for_event(
        &self,
        event_type: &EventType,
        assignment_id: AssignmentId,
    ) -> Result<Vec<PushTarget>, RepositoryError>;

    /// 通知ログを 1 件追記
    async fn write_notification_log(&self, entry: NotificationLogEntry)
    -> Result<(), RepositoryError>;

    /// 定期スイープで通知すべきイベントを取得
    ///
    /// 通知済みのアサインメント × イベントは返さないこと（重複排除はこのクエリの責務）。
    async fn due_events(&self, now: Timestamp) -> Result<Vec<NotificationEvent>, RepositoryError>;
}
