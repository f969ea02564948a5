//! UseCase: クライアント接続処理（OnClientConnected）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectClientUseCase::execute() メソッド
//! - ハンドシェイク時の ConnectionRegistry への登録
//!
//! ### なぜこのテストが必要か
//! - user_key が解決できない場合でも接続を切らない（untracked で継続する）ことを保証
//! - 同じユーザーの複数接続が別々の接続として登録されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：user_key ありの接続
//! - 異常系：user_key なし / 空白のみ
//! - エッジケース：同一ユーザーの 2 本目の接続

use std::sync::Arc;

use tsunagi_shared::time::Clock;

use crate::domain::{
    ConnectionIdFactory, ConnectionRegistry, HubSession, MessagePusher, PusherChannel, Timestamp,
    UserKey,
};

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    /// ConnectionRegistry（ユーザー → 接続）
    registry: Arc<ConnectionRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            clock,
        }
    }

    /// クライアント接続を実行
    ///
    /// # Arguments
    ///
    /// * `raw_user_key` - 認証済みセッションの claim から取り出した user_key（無い場合もある）
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// 接続済みのセッション。user_key が解決できなかった場合は untracked 状態で返す
    /// （エラーにはしない）。
    pub async fn execute(&self, raw_user_key: Option<String>, sender: PusherChannel) -> HubSession {
        let connection_id = ConnectionIdFactory::generate();
        let session =
            HubSession::new(connection_id.clone(), Timestamp::new(self.clock.now_millis()));

        // 1. user_key の解決
        let user_key = match raw_user_key.map(UserKey::new) {
            Some(Ok(user_key)) => Some(user_key),
            Some(Err(e)) => {
                tracing::warn!(
                    "Connection '{}' has an unusable user_key claim ({}); continuing untracked",
                    connection_id,
                    e
                );
                None
            }
            None => {
                tracing::warn!(
                    "Connection '{}' has no user_key claim; continuing untracked",
                    connection_id
                );
                None
            }
        };

        // 2. MessagePusher に送信チャンネルを登録
        self.message_pusher
            .register_connection(connection_id.clone(), sender)
            .await;

        // 3. 状態遷移 + ConnectionRegistry への登録
        if let Err(e) = session.handshake(user_key) {
            tracing::warn!("Connection '{}': {}", connection_id, e);
        }
        if let Some(user_key) = session.user_key() {
            self.registry.add(&user_key, &connection_id);
            tracing::info!(
                "Connection '{}' registered for user '{}'",
                connection_id,
                user_key
            );
        }

        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::SessionState, infrastructure::message_pusher::WebSocketMessagePusher};
    use tokio::sync::mpsc;
    use tsunagi_shared::time::FixedClock;

    fn create_usecase() -> (ConnectClientUseCase, Arc<ConnectionRegistry>) {
        let registry = Arc::new(ConnectionRegistry::new());
        let usecase = ConnectClientUseCase::new(
            registry.clone(),
            Arc::new(WebSocketMessagePusher::new()),
            Arc::new(FixedClock::new(1_000)),
        );
        (usecase, registry)
    }

    #[tokio::test]
    async fn test_connect_with_user_key_registers_connection() {
        // テスト項目: user_key ありの接続が ConnectionRegistry に登録される
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let session = usecase.execute(Some("U1".to_string()), tx).await;

        // then (期待する結果):
        let user_key = UserKey::new("U1".to_string()).unwrap();
        assert_eq!(session.user_key(), Some(user_key.clone()));
        assert_eq!(session.connected_at, Timestamp::new(1_000));
        assert_eq!(
            registry.connections(&user_key),
            vec![session.connection_id.clone()]
        );
    }

    #[tokio::test]
    async fn test_connect_without_user_key_is_untracked() {
        // テスト項目: user_key なしでもセッションは継続し、Registry には登録されない
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let session = usecase.execute(None, tx).await;

        // then (期待する結果):
        assert_eq!(session.state(), SessionState::ConnectedUntracked);
        assert_eq!(registry.online_user_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_with_blank_user_key_is_untracked() {
        // テスト項目: 空白のみの user_key は untracked 扱い
        let (usecase, registry) = create_usecase();
        let (tx, _rx) = mpsc::unbounded_channel();

        let session = usecase.execute(Some("   ".to_string()), tx).await;

        assert_eq!(session.state(), SessionState::ConnectedUntracked);
        assert_eq!(registry.online_user_count(), 0);
    }

    #[tokio::test]
    async fn test_same_user_multiple_connections() {
        // テスト項目: 同じユーザーの 2 本目の接続は別の接続として追加される
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        // when (操作):
        let first = usecase.execute(Some("U1".to_string()), tx1).await;
        let second = usecase.execute(Some("U1".to_string()), tx2).await;

        // then (期待する結果):
        assert_ne!(first.connection_id, second.connection_id);
        let user_key = UserKey::new("U1".to_string()).unwrap();
        assert_eq!(registry.connection_count(&user_key), 2);
    }
}
