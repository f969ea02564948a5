//! FCM 形式の HTTP API を使った PushProvider 実装
//!
//! リクエスト:
//!
//! ```json
//! {"message": {"token": "...", "notification": {"title": "...", "body": "..."}, "data": {...}}}
//! ```
//!
//! FCM の `data` は文字列値のみ受け付けるため、メタデータは文字列に揃えて送る。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{NotificationContent, PushError, PushProvider, PushReceipt};

#[derive(Debug, Serialize)]
struct FcmRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Debug, Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    notification: FcmNotification<'a>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    name: Option<String>,
}

/// FCM 形式のエンドポイントへ送る PushProvider
pub struct FcmPushProvider {
    endpoint: String,
    server_key: String,
    http_client: reqwest::Client,
}

impl FcmPushProvider {
    pub fn new(endpoint: String, server_key: String) -> Self {
        Self {
            endpoint,
            server_key,
            http_client: reqwest::Client::new(),
        }
    }
}

/// メタデータをすべて文字列値のマップに揃える
fn string_data(metadata: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match metadata {
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, serde_json::Value::String(value))
            })
            .collect(),
        _ => serde_json::Map::new(),
    }
}

#[async_trait]
impl PushProvider for FcmPushProvider {
    async fn send_push_notification(
        &self,
        token: &str,
        content: &NotificationContent,
        metadata: serde_json::Value,
    ) -> Result<PushReceipt, PushError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PushError::EmptyToken);
        }

        let request = FcmRequest {
            message: FcmMessage {
                token,
                notification: FcmNotification {
                    title: &content.title,
                    body: &content.body,
                },
                data: string_data(metadata),
            },
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.server_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PushError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        // 成功時のボディは任意（name が無くても成功扱い）
        let provider_message_id = response
            .json::<FcmResponse>()
            .await
            .ok()
            .and_then(|body| body.name);
        tracing::debug!("FCM accepted push: {:?}", provider_message_id);

        Ok(PushReceipt {
            provider_message_id,
        })
    }
}
