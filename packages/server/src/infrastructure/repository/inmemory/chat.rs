//! InMemory Chat Repository 実装
//!
//! ドメイン層が定義する ChatRepository trait の具体的な実装。
//! 業務レイヤー（ルーム・参加者・メッセージの永続化）をインメモリで代替する。
//!
//! 未知のルームキーへの書き込みはルームを新規作成する（数値 ID を採番）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ChatRepository, ChatRoom, MessageContent, MessageId, PersistedMessage,
    PushTarget, RepositoryError, RoomId, RoomKey, Timestamp, UserKey,
};

#[derive(Debug, Default)]
struct ChatStore {
    next_room_id: i64,
    rooms: HashMap<RoomKey, ChatRoom>,
    /// Key: RoomId, Value: 送信順のメッセージ
    messages: HashMap<RoomId, Vec<ChatMessage>>,
    /// Key: RoomId, Value: 参加者とそのプッシュトークン
    participants: HashMap<RoomId, Vec<PushTarget>>,
}

impl ChatStore {
    fn room_or_create(&mut self, room_key: &RoomKey, at: Timestamp) -> &mut ChatRoom {
        let next_room_id = &mut self.next_room_id;
        self.rooms.entry(room_key.clone()).or_insert_with(|| {
            *next_room_id += 1;
            ChatRoom::new(RoomId::new(*next_room_id), room_key.clone(), at)
        })
    }
}

/// インメモリ Chat Repository 実装
#[derive(Debug, Default)]
pub struct InMemoryChatRepository {
    store: Mutex<ChatStore>,
}

impl InMemoryChatRepository {
    /// 新しい InMemoryChatRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ルームを登録（既にあれば参加者を置き換える）
    pub async fn upsert_room(&self, room_key: &RoomKey, participants: Vec<PushTarget>) -> RoomId {
        let mut store = self.store.lock().await;
        let room_id = store.room_or_create(room_key, Timestamp::new(0)).id;
        store.participants.insert(room_id, participants);
        room_id
    }

    /// ルームのメッセージ（送信順）
    pub async fn messages(&self, room_key: &RoomKey) -> Vec<ChatMessage> {
        let store = self.store.lock().await;
        store
            .rooms
            .get(room_key)
            .and_then(|room| store.messages.get(&room.id))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn room(&self, room_key: &RoomKey) -> Option<ChatRoom> {
        self.store.lock().await.rooms.get(room_key).cloned()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn persist_chat_message(
        &self,
        room_key: &RoomKey,
        sender: &UserKey,
        sender_display_name: &str,
        content: &MessageContent,
        sent_at: Timestamp,
    ) -> Result<PersistedMessage, RepositoryError> {
        let mut store = self.store.lock().await;

        let room = store.room_or_create(room_key, sent_at);
        room.touch(sent_at);
        let room_id = room.id;

        let messages = store.messages.entry(room_id).or_default();
        let message_id = MessageId::new(messages.len() as i64 + 1);
        messages.push(ChatMessage {
            room_id,
            message_id,
            sender: sender.clone(),
            sender_display_name: sender_display_name.to_string(),
            content: content.clone(),
            sent_at,
        });

        Ok(PersistedMessage {
            room_id,
            message_id,
        })
    }

    async fn room_participants_minus_live(
        &self,
        room_id: RoomId,
        live_user_keys: Vec<UserKey>,
    ) -> Result<Vec<PushTarget>, RepositoryError> {
        let store = self.store.lock().await;
        if !store.rooms.values().any(|room| room.id == room_id) {
            return Err(RepositoryError::RoomNotFound(room_id.value().to_string()));
        }

        Ok(store
            .participants
            .get(&room_id)
            .map(|participants| {
                participants
                    .iter()
                    .filter(|p| !live_user_keys.contains(&p.user_key))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
