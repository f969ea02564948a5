//! UseCase: 通知ディスパッチ（NotificationDispatcher）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DispatchNotificationsUseCase::execute() / notify_chat() メソッド
//! - 通知ログの書き込み → セッション内配信 → 外部プッシュの順序と独立性
//!
//! ### なぜこのテストが必要か
//! - 1 件のプッシュ失敗がバッチ全体を止めないことを保証
//! - 同一実行内の重複（assignment × user × type × channel）が 1 回しか処理されないことを確認
//! - ログ書き込みに失敗した宛先には配信しないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数宛先へのログ + 配信 + プッシュ
//! - 異常系：アサインメント不在、ログ書き込み失敗、プッシュ失敗、プッシュのタイムアウト
//! - エッジケース：宛先 0 件、トークン未登録、recipient 指定による絞り込み

use std::{collections::HashSet, sync::Arc, time::Duration};

use serde_json::json;
use tsunagi_shared::time::{Clock, timestamp_to_rfc3339};

use crate::domain::{
    AssignmentId, Channel, ChatMessage, ConnectionRegistry, DispatchReport, EventType,
    FrameFormatter, MessagePusher, NotificationComposer, NotificationContent, NotificationEvent,
    NotificationLogEntry, NotificationRepository, PushError, PushProvider, PushTarget, Timestamp,
    UserKey, push_to_each,
};

/// 同一実行内の重複判定キー（assignment, user, type, channel）
type DedupKey = (Option<AssignmentId>, UserKey, String, Channel);

/// 1 つの通知文面と、その宛先に共通する情報
struct Delivery {
    assignment_id: Option<AssignmentId>,
    notification_type: String,
    content: NotificationContent,
    metadata: serde_json::Value,
}

/// 通知ディスパッチのユースケース
///
/// HTTP からの同期トリガー・チャット・定期スイープから並行に呼ばれる。
pub struct DispatchNotificationsUseCase {
    notification_repository: Arc<dyn NotificationRepository>,
    registry: Arc<ConnectionRegistry>,
    /// MessagePusher（セッション内配信）
    message_pusher: Arc<dyn MessagePusher>,
    frame_formatter: Arc<dyn FrameFormatter>,
    /// PushProvider（FCM / WebPush）
    push_provider: Arc<dyn PushProvider>,
    clock: Arc<dyn Clock>,
    /// 宛先 1 件あたりのプッシュ呼び出しの上限時間
    push_timeout: Duration,
}

impl DispatchNotificationsUseCase {
    /// 新しい DispatchNotificationsUseCase を作成
    pub fn new(
        notification_repository: Arc<dyn NotificationRepository>,
        registry: Arc<ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        frame_formatter: Arc<dyn FrameFormatter>,
        push_provider: Arc<dyn PushProvider>,
        clock: Arc<dyn Clock>,
        push_timeout: Duration,
    ) -> Self {
        Self {
            notification_repository,
            registry,
            message_pusher,
            frame_formatter,
            push_provider,
            clock,
            push_timeout,
        }
    }

    /// イベントのバッチをディスパッチする
    ///
    /// イベント単位・宛先単位の失敗はログに残してカウントするだけで、バッチは継続する。
    pub async fn execute(&self, events: Vec<NotificationEvent>) -> DispatchReport {
        let mut report = DispatchReport {
            events: events.len(),
            ..Default::default()
        };
        let mut handled: HashSet<DedupKey> = HashSet::new();

        for event in &events {
            self.dispatch_event(event, &mut handled, &mut report).await;
        }

        tracing::info!(
            "Dispatched {} event(s): logged={}, live={}, pushed={}, push_failures={}, skipped={}",
            report.events,
            report.logged,
            report.live_deliveries,
            report.pushed,
            report.push_failures,
            report.skipped_events
        );
        report
    }

    /// チャットメッセージを、ライブでない参加者へ通知する
    ///
    /// # Arguments
    ///
    /// * `message` - 永続化済みのチャットメッセージ
    /// * `targets` - ルーム参加者のうちライブ接続を持たない宛先（送信者は除外済み）
    pub async fn notify_chat(&self, message: &ChatMessage, targets: Vec<PushTarget>) -> DispatchReport {
        let mut report = DispatchReport {
            events: 1,
            ..Default::default()
        };
        if targets.is_empty() {
            tracing::debug!(
                "No offline participants to notify for message {} in room {}",
                message.message_id.value(),
                message.room_id.value()
            );
            return report;
        }

        let sent_at = timestamp_to_rfc3339(message.sent_at.value(), self.clock.now().offset());
        let delivery = Delivery {
            assignment_id: None,
            notification_type: EventType::ChatMessage.as_code(),
            content: NotificationComposer::compose_chat(
                &message.sender_display_name,
                message.content.as_str(),
            ),
            metadata: json!({
                "type": EventType::ChatMessage.as_code(),
                "room_id": message.room_id.value().to_string(),
                "message_id": message.message_id.value().to_string(),
                "sent_at": sent_at,
            }),
        };

        let mut handled: HashSet<DedupKey> = HashSet::new();
        self.deliver(&delivery, targets, &mut handled, &mut report)
            .await;
        report
    }

    async fn dispatch_event(
        &self,
        event: &NotificationEvent,
        handled: &mut HashSet<DedupKey>,
        report: &mut DispatchReport,
    ) {
        let assignment_id = event.assignment_id;

        // 1. アサインメント情報の取得（不在ならこのイベントのみスキップ）
        let summary = match self
            .notification_repository
            .load_assignment(assignment_id)
            .await
        {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                tracing::warn!(
                    "Assignment {} not found; skipping '{}' event",
                    assignment_id,
                    event.event_type.as_code()
                );
                report.skipped_events += 1;
                return;
            }
            Err(e) => {
                tracing::error!("Failed to load assignment {}: {}", assignment_id, e);
                report.skipped_events += 1;
                return;
            }
        };

        // 2. 宛先の解決（recipient 指定があればその宛先のみ）
        let targets = match self
            .notification_repository
            .resolve_recipients_for_event(&event.event_type, assignment_id)
            .await
        {
            Ok(targets) => targets,
            Err(e) => {
                tracing::error!(
                    "Failed to resolve recipients for assignment {}: {}",
                    assignment_id,
                    e
                );
                report.skipped_events += 1;
                return;
            }
        };
        let targets: Vec<PushTarget> = match &event.recipient {
            Some(recipient) => targets
                .into_iter()
                .filter(|target| &target.user_key == recipient)
                .collect(),
            None => targets,
        };
        if targets.is_empty() {
            tracing::debug!(
                "No recipients for '{}' on assignment {}",
                event.event_type.as_code(),
                assignment_id
            );
            report.skipped_events += 1;
            return;
        }

        // 3. 文面はイベントごとに 1 回だけ組み立てる
        let delivery = Delivery {
            assignment_id: Some(assignment_id),
            notification_type: event.event_type.as_code(),
            content: NotificationComposer::compose(&event.event_type, &summary),
            metadata: json!({
                "type": event.event_type.as_code(),
                "assignment_id": assignment_id.value().to_string(),
            }),
        };

        self.deliver(&delivery, targets, handled, report).await;
    }

    /// 宛先ごとに「ログ → セッション内配信 → 外部プッシュ」を行う
    async fn deliver(
        &self,
        delivery: &Delivery,
        targets: Vec<PushTarget>,
        handled: &mut HashSet<DedupKey>,
        report: &mut DispatchReport,
    ) {
        let sent_at = Timestamp::new(self.clock.now_millis());
        let frame = self.frame_formatter.notification(
            &delivery.notification_type,
            delivery.assignment_id,
            &delivery.content,
        );
        let mut live_notified: HashSet<UserKey> = HashSet::new();

        for target in targets {
            let key = (
                delivery.assignment_id,
                target.user_key.clone(),
                delivery.notification_type.clone(),
                target.channel,
            );
            if !handled.insert(key) {
                tracing::debug!(
                    "Skipping duplicate '{}' notification for user '{}' ({})",
                    delivery.notification_type,
                    target.user_key,
                    target.channel.as_str()
                );
                report.duplicates_skipped += 1;
                continue;
            }

            // 1. 通知ログ（失敗したらこの宛先の配信は行わない）
            let entry = NotificationLogEntry {
                user_key: target.user_key.clone(),
                assignment_id: delivery.assignment_id,
                title: delivery.content.title.clone(),
                body: delivery.content.body.clone(),
                notification_type: delivery.notification_type.clone(),
                channel: target.channel,
                sent_at,
            };
            if let Err(e) = self
                .notification_repository
                .write_notification_log(entry)
                .await
            {
                tracing::error!(
                    "Failed to write notification log for user '{}': {}",
                    target.user_key,
                    e
                );
                report.log_failures += 1;
                continue;
            }
            report.logged += 1;

            // 2. セッション内配信（ユーザーごとに 1 回）
            if live_notified.insert(target.user_key.clone())
                && let Some(frame) = &frame
            {
                let connections = self.registry.connections(&target.user_key);
                if !connections.is_empty() {
                    let result =
                        push_to_each(self.message_pusher.as_ref(), &connections, frame).await;
                    report.live_deliveries += result.delivered;
                }
            }

            // 3. 外部プッシュ
            self.push(delivery, &target, report).await;
        }
    }

    async fn push(&self, delivery: &Delivery, target: &PushTarget, report: &mut DispatchReport) {
        let Some(token) = target.usable_token() else {
            tracing::debug!(
                "User '{}' has no {} push token; skipping push",
                target.user_key,
                target.channel.as_str()
            );
            return;
        };

        let call = self.push_provider.send_push_notification(
            token,
            &delivery.content,
            delivery.metadata.clone(),
        );
        let result = match tokio::time::timeout(self.push_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(PushError::Timeout(self.push_timeout.as_millis() as u64)),
        };

        match result {
            Ok(receipt) => {
                tracing::debug!(
                    "Pushed '{}' to user '{}' ({}): {:?}",
                    delivery.notification_type,
                    target.user_key,
                    target.channel.as_str(),
                    receipt.provider_message_id
                );
                report.pushed += 1;
            }
            Err(e) => {
                if e.is_invalid_token() {
                    tracing::warn!(
                        "Push token of user '{}' ({}) looks invalid: {}",
                        target.user_key,
                        target.channel.as_str(),
                        e
                    );
                } else {
                    tracing::warn!(
                        "Failed to push to user '{}' ({}): {}",
                        target.user_key,
                        target.channel.as_str(),
                        e
                    );
                }
                report.push_failures += 1;
            }
        }
    }
}
