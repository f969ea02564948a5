//! UseCase: クライアント切断処理（OnClientDisconnected）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectClientUseCase::execute() メソッド
//! - RoomMembership → ConnectionRegistry → MessagePusher の順での後始末
//!
//! ### なぜこのテストが必要か
//! - 切断後に RoomMembership が切断済みの接続を参照し続けない（リークしない）ことを保証
//! - 同じユーザーの他の接続には影響しないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：ルームに参加していた接続の切断
//! - 異常系：トランスポートエラーによる切断
//! - エッジケース：二重の切断呼び出し、untracked セッションの切断

use std::sync::Arc;

use crate::domain::{
    ConnectionRegistry, DisconnectReason, HubSession, MessagePusher, RoomKey, RoomMembership,
};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    registry: Arc<ConnectionRegistry>,
    membership: Arc<RoomMembership>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        membership: Arc<RoomMembership>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            membership,
            message_pusher,
        }
    }

    /// クライアント切断を実行
    ///
    /// # Arguments
    ///
    /// * `session` - 切断するセッション
    /// * `reason` - 切断理由（トランスポートのエラーはログに残すのみで再送出しない）
    ///
    /// # Returns
    ///
    /// 接続が取り除かれたルームの一覧（既に切断済みなら空）
    pub async fn execute(&self, session: &HubSession, reason: DisconnectReason) -> Vec<RoomKey> {
        let connection_id = session.connection_id.clone();

        let Some(previous) = session.close() else {
            tracing::debug!("Connection '{}' already disconnected", connection_id);
            return Vec::new();
        };

        match &reason {
            DisconnectReason::TransportError(_) => {
                tracing::warn!("Connection '{}' closed: {}", connection_id, reason);
            }
            _ => {
                tracing::info!("Connection '{}' closed: {}", connection_id, reason);
            }
        }

        // 1. 全ルームから取り除く（Registry より先）
        let rooms = self.membership.remove_connection_from_all_rooms(&connection_id);

        // 2. ConnectionRegistry から削除
        if let Some(user_key) = previous.user_key() {
            self.registry.remove(user_key, &connection_id);
            tracing::info!(
                "Connection '{}' of user '{}' removed ({} connection(s) remain)",
                connection_id,
                user_key,
                self.registry.connection_count(user_key)
            );
        }

        // 3. MessagePusher から送信チャンネルを登録解除
        self.message_pusher
            .unregister_connection(&connection_id)
            .await;

        rooms
    }
}
