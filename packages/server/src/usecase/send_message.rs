//! UseCase: チャットメッセージ送信処理（ChatSessionManager）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 永続化 → ルーム内ブロードキャスト → ライブでない参加者への通知 の順序
//!
//! ### なぜこのテストが必要か
//! - 永続化に失敗したメッセージがブロードキャストされない（幻のメッセージを出さない）ことを保証
//! - 送信者自身の接続を含むルーム内の全接続に配信されることを確認
//! - オフラインの参加者にはプッシュ通知が届くことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 ユーザーが参加するルームでの送信
//! - 異常系：room_id 欠落、本文が空、untracked セッションからの送信、永続化失敗
//! - エッジケース：片方のユーザーが切断した後の送信（プッシュにフォールバック）

use std::{collections::BTreeSet, sync::Arc};

use tsunagi_shared::time::Clock;

use crate::domain::{
    ChatMessage, ChatRepository, ConnectionRegistry, FrameFormatter, MessageContent, MessageId,
    MessagePusher, RoomId, RoomKey, RoomMembership, Timestamp, UserKey, push_to_each,
};

use super::{dispatch_notifications::DispatchNotificationsUseCase, error::SendMessageError};

/// チャット送信の入力
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    /// クライアントが指定したルームキー（空ならバリデーションエラー）
    pub room_id: String,
    /// 送信者（untracked セッションなら `None`）
    pub sender: Option<UserKey>,
    pub sender_display_name: Option<String>,
    pub content: String,
}

/// 配信の内訳
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatDeliveryStatus {
    /// ルーム内の接続へ配信できた数
    pub live_deliveries: usize,
    /// ルーム内の接続への配信に失敗した数
    pub live_failures: usize,
    /// ライブでない参加者へのプッシュ成功数
    pub offline_pushes: usize,
}

/// チャット送信の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendMessageOutcome {
    pub room_id: RoomId,
    pub message_id: MessageId,
    pub status: ChatDeliveryStatus,
}

/// チャットメッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（業務レイヤーの永続化の抽象化）
    chat_repository: Arc<dyn ChatRepository>,
    membership: Arc<RoomMembership>,
    registry: Arc<ConnectionRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    frame_formatter: Arc<dyn FrameFormatter>,
    dispatcher: Arc<DispatchNotificationsUseCase>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        chat_repository: Arc<dyn ChatRepository>,
        membership: Arc<RoomMembership>,
        registry: Arc<ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        frame_formatter: Arc<dyn FrameFormatter>,
        dispatcher: Arc<DispatchNotificationsUseCase>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            chat_repository,
            membership,
            registry,
            message_pusher,
            frame_formatter,
            dispatcher,
            clock,
        }
    }

    /// チャットメッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(SendMessageOutcome)` - 永続化済みの (room_id, message_id) と配信の内訳
    /// * `Err(SendMessageError)` - バリデーション / 永続化の失敗（この場合は一切配信しない）
    pub async fn execute(
        &self,
        command: SendMessageCommand,
    ) -> Result<SendMessageOutcome, SendMessageError> {
        // 1. バリデーション
        let room_key =
            RoomKey::new(command.room_id).map_err(|_| SendMessageError::MissingRoomId)?;
        let sender = command.sender.ok_or(SendMessageError::UntrackedSender)?;
        let content =
            MessageContent::new(command.content).map_err(SendMessageError::InvalidContent)?;
        let sender_display_name = command
            .sender_display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| sender.to_string());

        // 2. 送信時刻（設定されたタイムゾーンの Clock から）
        let sent_at = Timestamp::new(self.clock.now_millis());

        // 3. 永続化（失敗したらブロードキャストもディスパッチもしない）
        let persisted = self
            .chat_repository
            .persist_chat_message(&room_key, &sender, &sender_display_name, &content, sent_at)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to persist message from '{}' in room '{}': {}",
                    sender,
                    room_key,
                    e
                );
                SendMessageError::PersistFailed(e)
            })?;

        let message = ChatMessage {
            room_id: persisted.room_id,
            message_id: persisted.message_id,
            sender,
            sender_display_name,
            content,
            sent_at,
        };

        // 4. ルーム内の全接続へブロードキャスト（送信者自身の接続を含む）
        let members = self.membership.members(&room_key);
        let mut status = ChatDeliveryStatus::default();
        if let Some(frame) = self.frame_formatter.chat(&room_key, &message) {
            let result = push_to_each(self.message_pusher.as_ref(), &members, &frame).await;
            status.live_deliveries = result.delivered;
            status.live_failures = result.failed;
        }

        // 5. ライブでない参加者（送信者を除く）を通知チャネルへ
        let live_user_keys: Vec<UserKey> = members
            .iter()
            .filter_map(|connection_id| self.registry.user_of(connection_id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        match self
            .chat_repository
            .room_participants_minus_live(message.room_id, live_user_keys)
            .await
        {
            Ok(targets) => {
                let targets = targets
                    .into_iter()
                    .filter(|target| target.user_key != message.sender)
                    .collect();
                let report = self.dispatcher.notify_chat(&message, targets).await;
                status.offline_pushes = report.pushed;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to resolve offline participants of room {}: {}",
                    message.room_id.value(),
                    e
                );
            }
        }

        tracing::info!(
            "Message {} from '{}' in room '{}' delivered to {} connection(s), {} push(es)",
            message.message_id.value(),
            message.sender,
            room_key,
            status.live_deliveries,
            status.offline_pushes
        );

        Ok(SendMessageOutcome {
            room_id: message.room_id,
            message_id: message.message_id,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            Channel, ConnectionId, PersistedMessage, PushReceipt, PushTarget, RepositoryError,
            message_pusher::MockMessagePusher,
            push_provider::MockPushProvider,
            repository::{MockChatRepository, MockNotificationRepository},
        },
        infrastructure::{dto::frame::JsonFrameFormatter, message_pusher::WebSocketMessagePusher},
    };
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicI64, Ordering},
        },
        time::Duration,
    };
    use tokio::sync::mpsc;
    use tsunagi_shared::time::FixedClock;

    fn user(key: &str) -> UserKey {
        UserKey::new(key.to_string()).unwrap()
    }

    fn command(room_id: &str, sender: Option<&str>, content: &str) -> SendMessageCommand {
        SendMessageCommand {
            room_id: room_id.to_string(),
            sender: sender.map(user),
            sender_display_name: None,
            content: content.to_string(),
        }
    }

    fn dispatcher_with(
        registry: Arc<ConnectionRegistry>,
        pusher: Arc<dyn MessagePusher>,
        repository: MockNotificationRepository,
        provider: MockPushProvider,
    ) -> Arc<DispatchNotificationsUseCase> {
        Arc::new(DispatchNotificationsUseCase::new(
            Arc::new(repository),
            registry,
            pusher,
            Arc::new(JsonFrameFormatter),
            Arc::new(provider),
            Arc::new(FixedClock::new(1_000)),
            Duration::from_millis(200),
        ))
    }

    /// 呼ばれたらテストが失敗する依存関係で組み立てる
    fn usecase_with_strict_mocks(chat_repository: MockChatRepository) -> SendMessageUseCase {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut pusher = MockMessagePusher::new();
        pusher.expect_push_to().never();
        let pusher: Arc<dyn MessagePusher> = Arc::new(pusher);
        let dispatcher = dispatcher_with(
            registry.clone(),
            pusher.clone(),
            MockNotificationRepository::new(),
            MockPushProvider::new(),
        );
        SendMessageUseCase::new(
            Arc::new(chat_repository),
            Arc::new(RoomMembership::new()),
            registry,
            pusher,
            Arc::new(JsonFrameFormatter),
            dispatcher,
            Arc::new(FixedClock::new(1_000)),
        )
    }

    #[tokio::test]
    async fn test_persist_failure_means_no_broadcast() {
        // テスト項目: 永続化に失敗した場合、ブロードキャストもディスパッチも行われない
        // given (前提条件):
        let mut chat_repository = MockChatRepository::new();
        chat_repository
            .expect_persist_chat_message()
            .times(1)
            .returning(|_, _, _, _, _| Err(RepositoryError::Unavailable("db down".to_string())));
        chat_repository.expect_room_participants_minus_live().never();
        let usecase = usecase_with_strict_mocks(chat_repository);

        // when (操作):
        let result = usecase.execute(command("R5", Some("U1"), "hi")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(SendMessageError::PersistFailed(RepositoryError::Unavailable(
                "db down".to_string()
            )))
        );
    }

    #[tokio::test]
    async fn test_missing_room_id_is_rejected_before_persist() {
        // テスト項目: room_id が空なら永続化せずにバリデーションエラー
        let mut chat_repository = MockChatRepository::new();
        chat_repository.expect_persist_chat_message().never();
        let usecase = usecase_with_strict_mocks(chat_repository);

        let result = usecase.execute(command("  ", Some("U1"), "hi")).await;

        assert_eq!(result, Err(SendMessageError::MissingRoomId));
    }

    #[tokio::test]
    async fn test_untracked_sender_is_rejected() {
        // テスト項目: user_key のないセッションからの送信はエラー
        let mut chat_repository = MockChatRepository::new();
        chat_repository.expect_persist_chat_message().never();
        let usecase = usecase_with_strict_mocks(chat_repository);

        let result = usecase.execute(command("R5", None, "hi")).await;

        assert_eq!(result, Err(SendMessageError::UntrackedSender));
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected() {
        // テスト項目: 空白のみの本文はエラー
        let mut chat_repository = MockChatRepository::new();
        chat_repository.expect_persist_chat_message().never();
        let usecase = usecase_with_strict_mocks(chat_repository);

        let result = usecase.execute(command("R5", Some("U1"), "   ")).await;

        assert!(matches!(result, Err(SendMessageError::InvalidContent(_))));
    }

    #[tokio::test]
    async fn test_room_scenario_live_then_push_after_disconnect() {
        // テスト項目: U1・U2 が R5 に参加 → 両方の接続に配信、U2 切断後は U2 にプッシュ
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let membership = Arc::new(RoomMembership::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let room = RoomKey::new("R5".to_string()).unwrap();
        let c1 = ConnectionId::new("c1".to_string()).unwrap();
        let c2 = ConnectionId::new("c2".to_string()).unwrap();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        pusher.register_connection(c1.clone(), tx1).await;
        pusher.register_connection(c2.clone(), tx2).await;
        registry.add(&user("U1"), &c1);
        registry.add(&user("U2"), &c2);
        membership.join(&room, &c1);
        membership.join(&room, &c2);

        let next_message_id = Arc::new(AtomicI64::new(101));
        let mut chat_repository = MockChatRepository::new();
        chat_repository
            .expect_persist_chat_message()
            .returning(move |_, _, _, _, _| {
                Ok(PersistedMessage {
                    room_id: RoomId::new(5),
                    message_id: MessageId::new(next_message_id.fetch_add(1, Ordering::SeqCst)),
                })
            });
        let participants = vec![
            PushTarget {
                user_key: user("U1"),
                channel: Channel::App,
                token: Some("tok-1".to_string()),
            },
            PushTarget {
                user_key: user("U2"),
                channel: Channel::App,
                token: Some("tok-2".to_string()),
            },
        ];
        chat_repository
            .expect_room_participants_minus_live()
            .returning(move |_, live| {
                Ok(participants
                    .iter()
                    .filter(|p| !live.contains(&p.user_key))
                    .cloned()
                    .collect())
            });

        let mut notification_repository = MockNotificationRepository::new();
        notification_repository
            .expect_write_notification_log()
            .returning(|_| Ok(()));
        let pushed_tokens = Arc::new(Mutex::new(Vec::new()));
        let pushed_tokens_clone = pushed_tokens.clone();
        let mut provider = MockPushProvider::new();
        provider
            .expect_send_push_notification()
            .returning(move |token, _, _| {
                pushed_tokens_clone.lock().unwrap().push(token.to_string());
                Ok(PushReceipt::default())
            });
        let dispatcher = dispatcher_with(
            registry.clone(),
            pusher.clone(),
            notification_repository,
            provider,
        );
        let usecase = SendMessageUseCase::new(
            Arc::new(chat_repository),
            membership.clone(),
            registry.clone(),
            pusher.clone(),
            Arc::new(JsonFrameFormatter),
            dispatcher,
            Arc::new(FixedClock::new(1_000)),
        );

        // when (操作): U1 が送信
        let first = usecase
            .execute(command("R5", Some("U1"), "hi"))
            .await
            .unwrap();

        // then (期待する結果): 両方の接続に届き、プッシュはなし
        assert_eq!(first.room_id, RoomId::new(5));
        assert_eq!(first.message_id, MessageId::new(101));
        assert_eq!(first.status.live_deliveries, 2);
        for rx in [&mut rx1, &mut rx2] {
            let frame: serde_json::Value =
                serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(frame["type"], "chat");
            assert_eq!(frame["room_id"], 5);
            assert_eq!(frame["message_id"], 101);
            assert_eq!(frame["content"], "hi");
        }
        assert!(pushed_tokens.lock().unwrap().is_empty());

        // when (操作): U2 が切断した後に U1 が送信
        membership.remove_connection_from_all_rooms(&c2);
        registry.remove(&user("U2"), &c2);
        pusher.unregister_connection(&c2).await;
        let second = usecase
            .execute(command("R5", Some("U1"), "are you there?"))
            .await
            .unwrap();

        // then (期待する結果): c1 のみに届き、U2 のトークンへプッシュされる
        assert_eq!(second.message_id, MessageId::new(102));
        assert_eq!(second.status.live_deliveries, 1);
        assert_eq!(second.status.offline_pushes, 1);
        let frame: serde_json::Value = serde_json::from_str(&rx1.recv().await.unwrap()).unwrap();
        assert_eq!(frame["message_id"], 102);
        assert!(rx2.try_recv().is_err());
        assert_eq!(*pushed_tokens.lock().unwrap(), vec!["tok-2".to_string()]);
    }
}
