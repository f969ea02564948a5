//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - 接続へのメッセージ送信（push_to）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! 送信はチャンネルへの enqueue のみで、ソケットへの書き込みは接続ごとの送信タスクが行うため、
//! ある接続が詰まっても他の接続への送信は止まりません。

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中の WebSocket sender
    ///
    /// Key: ConnectionId
    /// Value: PusherChannel
    channels: DashMap<ConnectionId, PusherChannel>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録中の接続数
    pub fn connection_count(&self) -> usize {
        self.channels.len()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        self.channels.insert(connection_id, sender);
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        if self.channels.remove(connection_id).is_some() {
            tracing::debug!(
                "Connection '{}' unregistered from MessagePusher",
                connection_id
            );
        }
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        // sender を clone してからロックを解放し、送信する
        let sender = self
            .channels
            .get(connection_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;

        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to connection '{}'", connection_id);
        Ok(())
    }
}
