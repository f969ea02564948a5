//! プッシュ送信先が未設定のときの PushProvider

use async_trait::async_trait;

use crate::domain::{NotificationContent, PushError, PushProvider, PushReceipt};

#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPushProvider;

#[async_trait]
impl PushProvider for DisabledPushProvider {
    async fn send_push_notification(
        &self,
        _token: &str,
        content: &NotificationContent,
        _metadata: serde_json::Value,
    ) -> Result<PushReceipt, PushError> {
        tracing::debug!("Push disabled; dropping '{}'", content.title);
        Err(PushError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_provider_reports_not_configured() {
        let provider = DisabledPushProvider;
        let content = NotificationContent {
            title: "t".to_string(),
            body: "b".to_string(),
        };

        let result = provider
            .send_push_notification("tok", &content, serde_json::Value::Null)
            .await;

        assert_eq!(result, Err(PushError::NotConfigured));
    }
}
