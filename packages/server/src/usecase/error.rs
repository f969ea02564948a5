//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RepositoryError, ValueObjectError};

/// チャット送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("room_id is missing")]
    MissingRoomId,

    #[error("session has no user identity")]
    UntrackedSender,

    #[error("invalid message content: {0}")]
    InvalidContent(ValueObjectError),

    #[error("failed to persist chat message: {0}")]
    PersistFailed(RepositoryError),
}

/// ルーム参加・退出のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomMembershipError {
    #[error("room_id is missing")]
    MissingRoomId,

    #[error("session is not open")]
    SessionClosed,
}
