//! InMemory Notification Repository 実装
//!
//! アサインメント情報・宛先・通知ログ・スケジュール済みイベントをインメモリで保持する。
//! 通知ログは追記のみ。`due_events` は期限の来たイベントを取り出し（キューから削除）、
//! 既にログのある組み合わせは除外する。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    AssignmentId, AssignmentSummary, EventType, NotificationEvent, NotificationLogEntry,
    NotificationRepository, PushTarget, RepositoryError, Timestamp,
};

#[derive(Debug, Default)]
struct NotificationStore {
    assignments: HashMap<AssignmentId, AssignmentSummary>,
    recipients: HashMap<AssignmentId, Vec<PushTarget>>,
    logs: Vec<NotificationLogEntry>,
    /// (期限, イベント)
    scheduled: Vec<(Timestamp, NotificationEvent)>,
}

impl NotificationStore {
    fn already_notified(&self, event: &NotificationEvent) -> bool {
        let notification_type = event.event_type.as_code();
        self.logs.iter().any(|entry| {
            entry.assignment_id == Some(event.assignment_id)
                && entry.notification_type == notification_type
                && event
                    .recipient
                    .as_ref()
                    .is_none_or(|recipient| recipient == &entry.user_key)
        })
    }
}

/// インメモリ Notification Repository 実装
#[derive(Debug, Default)]
pub struct InMemoryNotificationRepository {
    store: Mutex<NotificationStore>,
}

impl InMemoryNotificationRepository {
    /// 新しい InMemoryNotificationRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// アサインメントとその宛先を登録（既存なら置き換え）
    pub async fn upsert_assignment(&self, summary: AssignmentSummary, recipients: Vec<PushTarget>) {
        let mut store = self.store.lock().await;
        store.recipients.insert(summary.assignment_id, recipients);
        store.assignments.insert(summary.assignment_id, summary);
    }

    /// 指定時刻以降にスイープで通知するイベントを登録
    pub async fn schedule_event(&self, due_at: Timestamp, event: NotificationEvent) {
        self.store.lock().await.scheduled.push((due_at, event));
    }

    /// 書き込まれた通知ログ（書き込み順）
    pub async fn logs(&self) -> Vec<NotificationLogEntry> {
        self.store.lock().await.logs.clone()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn load_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Option<AssignmentSummary>, RepositoryError> {
        Ok(self
            .store
            .lock()
            .await
            .assignments
            .get(&assignment_id)
            .cloned())
    }

    async fn resolve_recipients_for_event(
        &self,
        event_type: &EventType,
        assignment_id: AssignmentId,
    ) -> Result<Vec<PushTarget>, RepositoryError> {
        let store = self.store.lock().await;
        if !store.assignments.contains_key(&assignment_id) {
            return Err(RepositoryError::AssignmentNotFound(assignment_id.value()));
        }
        let recipients = store
            .recipients
            .get(&assignment_id)
            .cloned()
            .unwrap_or_default();
        tracing::debug!(
            "Resolved {} recipient(s) for '{}' on assignment {}",
            recipients.len(),
            event_type.as_code(),
            assignment_id
        );
        Ok(recipients)
    }

    async fn write_notification_log(&self, entry: NotificationLogEntry) -> Result<(), RepositoryError> {
        self.store.lock().await.logs.push(entry);
        Ok(())
    }

    async fn due_events(&self, now: Timestamp) -> Result<Vec<NotificationEvent>, RepositoryError> {
        let mut store = self.store.lock().await;
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut store.scheduled)
            .into_iter()
            .partition(|(due_at, _)| *due_at <= now);
        store.scheduled = pending;

        Ok(due
            .into_iter()
            .map(|(_, event)| event)
            .filter(|event| !store.already_notified(event))
            .collect())
    }
}
