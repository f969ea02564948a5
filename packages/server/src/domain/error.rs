//! ドメイン層のエラー定義

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} is too long ({len} > {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// Repository（業務レイヤーのコラボレーター）呼び出しのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Assignment not found: {0}")]
    AssignmentNotFound(i64),

    #[error("Persistence rejected the write: {0}")]
    Rejected(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// セッション内（WebSocket）送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// 外部プッシュプロバイダー（FCM / WebPush）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("Push provider is not configured")]
    NotConfigured,

    #[error("Push token is empty")]
    EmptyToken,

    #[error("Push provider rejected the request: {status} - {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Push transport error: {0}")]
    Transport(String),

    #[error("Push provider timed out after {0} ms")]
    Timeout(u64),
}

impl PushError {
    /// トークン自体が無効（再送しても成功しない）とみなせるか
    pub fn is_invalid_token(&self) -> bool {
        matches!(
            self,
            PushError::EmptyToken | PushError::Rejected { status: 400 | 404, .. }
        )
    }
}
