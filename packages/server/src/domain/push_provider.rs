//! 外部プッシュプロバイダー（FCM / WebPush）の trait 定義

use async_trait::async_trait;

use super::{error::PushError, notification::NotificationContent};

/// プロバイダーが受理した結果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushReceipt {
    pub provider_message_id: Option<String>,
}

/// 外部プッシュ送信の trait（1 トークンにつき 1 回呼び出す）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn send_push_notification(
        &self,
        token: &str,
        content: &NotificationContent,
        metadata: serde_json::Value,
    ) -> Result<PushReceipt, PushError>;
}
