//! Value Object 定義
//!
//! 文字列・数値をそのまま引き回さず、意味ごとに型を分ける。
//! 生成時にバリデーションを行い、生成後は不変。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// メッセージ本文の最大長（文字数）
pub const MAX_MESSAGE_CONTENT_LEN: usize = 4000;

/// 認証済みセッションの claim から得られるユーザー識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    /// 新しい UserKey を作成（前後の空白は除去、空文字はエラー）
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::Empty("user_key"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserKey {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// トランスポート接続（WebSocket 1 本）の識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::Empty("connection_id"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ConnectionId の生成
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// UUID v4 から新しい ConnectionId を生成
    pub fn generate() -> ConnectionId {
        ConnectionId(Uuid::new_v4().to_string())
    }
}

/// ルーム（会話 / ブロードキャスト範囲）の識別子
///
/// クライアントが join / leave に使う文字列キー。永続化側の数値 ID は `RoomId`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::Empty("room_id"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomKey {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 永続化された ChatRoom の数値 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(i64);

impl RoomId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// ルーム内で単調増加するメッセージ ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 予約（送迎・通訳アサインメント）の ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(i64);

impl AssignmentId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// チャットメッセージ本文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("content"));
        }
        let len = value.chars().count();
        if len > MAX_MESSAGE_CONTENT_LEN {
            return Err(ValueObjectError::TooLong {
                field: "content",
                len,
                max: MAX_MESSAGE_CONTENT_LEN,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix timestamp (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
