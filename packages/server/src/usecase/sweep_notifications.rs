//! UseCase: 定期スイープによる通知（リマインダーなど）
//!
//! HTTP からの同期ディスパッチとは独立に動く 2 つ目の生産者。
//! 取得クエリ側が通知済みの組を除外するため、ここでは重複排除を行わない。

use std::sync::Arc;

use tsunagi_shared::time::Clock;

use crate::domain::{DispatchReport, NotificationRepository, Timestamp};

use super::dispatch_notifications::DispatchNotificationsUseCase;

/// 定期スイープのユースケース
pub struct SweepNotificationsUseCase {
    notification_repository: Arc<dyn NotificationRepository>,
    dispatcher: Arc<DispatchNotificationsUseCase>,
    clock: Arc<dyn Clock>,
}

impl SweepNotificationsUseCase {
    /// 新しい SweepNotificationsUseCase を作成
    pub fn new(
        notification_repository: Arc<dyn NotificationRepository>,
        dispatcher: Arc<DispatchNotificationsUseCase>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notification_repository,
            dispatcher,
            clock,
        }
    }

    /// 期限の来たイベントを取得してディスパッチする
    pub async fn execute(&self) -> DispatchReport {
        let now = Timestamp::new(self.clock.now_millis());
        let events = match self.notification_repository.due_events(now).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Failed to load due notification events: {}", e);
                return DispatchReport::default();
            }
        };

        if events.is_empty() {
            tracing::debug!("No due notification events");
            return DispatchReport::default();
        }

        tracing::info!("Sweeping {} due notification event(s)", events.len());
        self.dispatcher.execute(events).await
    }
}
