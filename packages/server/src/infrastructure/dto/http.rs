//! HTTP API request / response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::RecipientType;

/// POST /api/notifications/dispatch のリクエスト
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchRequestDto {
    pub events: Vec<NotificationEventDto>,
}

/// 通知イベント 1 件
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationEventDto {
    pub event_type: String,
    pub assignment_id: i64,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub recipient_type: RecipientType,
}

/// ディスパッチ結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DispatchReportDto {
    pub events: usize,
    pub skipped_events: usize,
    pub logged: usize,
    pub log_failures: usize,
    pub live_deliveries: usize,
    pub pushed: usize,
    pub push_failures: usize,
    pub duplicates_skipped: usize,
}

/// GET /api/presence/{user_key} のレスポンス
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PresenceDto {
    pub user_key: String,
    pub online: bool,
    pub connections: usize,
}
