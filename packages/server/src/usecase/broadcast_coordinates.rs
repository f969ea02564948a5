//! UseCase: 位置座標のライブ配信（LiveCoordinateBroadcaster）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BroadcastCoordinatesUseCase::broadcast() / execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 1 接続への送信失敗が他の接続への配信を妨げないことを保証
//! - ペイロードが加工されずにそのまま中継されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：観測者の全接続への配信
//! - 異常系：一部の接続への送信失敗
//! - エッジケース：観測者がオフライン、observer_keys に不正な値

use std::sync::Arc;

use crate::domain::{
    BroadcastReport, ConnectionRegistry, FrameFormatter, MessagePusher, UserKey, push_to_each,
};

/// 位置座標ブロードキャストのユースケース
///
/// ack もリトライも行わない（次の座標がすぐに届くため）。
pub struct BroadcastCoordinatesUseCase {
    registry: Arc<ConnectionRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    frame_formatter: Arc<dyn FrameFormatter>,
}

impl BroadcastCoordinatesUseCase {
    /// 新しい BroadcastCoordinatesUseCase を作成
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        frame_formatter: Arc<dyn FrameFormatter>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            frame_formatter,
        }
    }

    /// 観測者 1 人の全接続へ座標を送る
    pub async fn broadcast(&self, observer: &UserKey, frame: &str) -> BroadcastReport {
        let connections = self.registry.connections(observer);
        if connections.is_empty() {
            tracing::debug!("Observer '{}' has no live connection", observer);
            return BroadcastReport::default();
        }
        push_to_each(self.message_pusher.as_ref(), &connections, frame).await
    }

    /// クライアントからの send_coordinates を処理する
    ///
    /// # Arguments
    ///
    /// * `sender` - 送信元のユーザー（untracked なら `None`）
    /// * `observer_keys` - 配信先の観測者（空文字などの不正な値は無視）
    /// * `payload` - 中継する座標データ（加工しない）
    pub async fn execute(
        &self,
        sender: Option<&UserKey>,
        observer_keys: Vec<String>,
        payload: serde_json::Value,
    ) -> BroadcastReport {
        let Some(frame) = self.frame_formatter.coordinates(sender, payload) else {
            return BroadcastReport::default();
        };

        let mut total = BroadcastReport::default();
        for raw in observer_keys {
            let Ok(observer) = UserKey::new(raw) else {
                tracing::debug!("Ignoring blank observer key");
                continue;
            };
            let report = self.broadcast(&observer, &frame).await;
            total.delivered += report.delivered;
            total.failed += report.failed;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionId, MessagePushError, message_pusher::MockMessagePusher},
        infrastructure::{dto::frame::JsonFrameFormatter, message_pusher::WebSocketMessagePusher},
    };
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    fn user(key: &str) -> UserKey {
        UserKey::new(key.to_string()).unwrap()
    }

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_failure_on_one_connection_does_not_block_others() {
        // テスト項目: 接続 A への送信が失敗しても接続 B には届く
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        registry.add(&user("OBS"), &conn("a"));
        registry.add(&user("OBS"), &conn("b"));
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_push_to()
            .times(2)
            .returning(move |connection_id, content| {
                if connection_id.as_str() == "a" {
                    return Err(MessagePushError::PushFailed("socket closed".to_string()));
                }
                received_clone
                    .lock()
                    .unwrap()
                    .push((connection_id.clone(), content.to_string()));
                Ok(())
            });
        let usecase = BroadcastCoordinatesUseCase::new(
            registry,
            Arc::new(pusher),
            Arc::new(JsonFrameFormatter),
        );

        // when (操作):
        let report = usecase.broadcast(&user("OBS"), "{\"lat\":35.0}").await;

        // then (期待する結果):
        assert_eq!(report, BroadcastReport { delivered: 1, failed: 1 });
        assert_eq!(
            *received.lock().unwrap(),
            vec![(conn("b"), "{\"lat\":35.0}".to_string())]
        );
    }

    #[tokio::test]
    async fn test_payload_is_relayed_verbatim() {
        // テスト項目: ペイロードが coordinates フレームにそのまま入って届く
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register_connection(conn("c1"), tx).await;
        registry.add(&user("OBS"), &conn("c1"));
        let usecase = BroadcastCoordinatesUseCase::new(
            registry,
            pusher,
            Arc::new(JsonFrameFormatter),
        );
        let payload = json!({"lat": 35.6812, "lng": 139.7671, "heading": 90});

        // when (操作):
        let report = usecase
            .execute(
                Some(&user("DRIVER")),
                vec!["OBS".to_string(), " ".to_string()],
                payload.clone(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["type"], "coordinates");
        assert_eq!(frame["sender"], "DRIVER");
        assert_eq!(frame["payload"], payload);
    }

    #[tokio::test]
    async fn test_offline_observer_is_noop() {
        // テスト項目: 接続のない観測者への配信は何もしない
        let mut pusher = MockMessagePusher::new();
        pusher.expect_push_to().never();
        let usecase = BroadcastCoordinatesUseCase::new(
            Arc::new(ConnectionRegistry::new()),
            Arc::new(pusher),
            Arc::new(JsonFrameFormatter),
        );

        let report = usecase
            .execute(None, vec!["OBS".to_string()], json!({"lat": 1.0}))
            .await;

        assert_eq!(report, BroadcastReport::default());
    }
}
