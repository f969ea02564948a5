//! MessagePusher trait 定義
//!
//! セッション内（WebSocket 接続）へのメッセージ送信の抽象化。
//! WebSocket の生成は UI 層、sender の管理と送信は Infrastructure 層が担う。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, value_object::ConnectionId};

/// 接続ごとの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// セッション内送信の trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信チャンネルを登録解除（未登録なら何もしない）
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 特定の接続にメッセージを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;
}

/// 複数接続への送信結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// 各接続へ個別に送信する
///
/// ある接続への送信が失敗しても残りの接続への送信は継続する（失敗はログに残すのみ）。
pub async fn push_to_each(
    pusher: &dyn MessagePusher,
    targets: &[ConnectionId],
    content: &str,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for target in targets {
        match pusher.push_to(target, content).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::warn!("Failed to push to connection '{}': {}", target, e);
                report.failed += 1;
            }
        }
    }

    report
}
