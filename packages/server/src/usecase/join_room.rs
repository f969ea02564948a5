//! UseCase: ルーム参加処理

use std::sync::Arc;

use crate::domain::{HubSession, RoomKey, RoomMembership};

use super::error::RoomMembershipError;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    membership: Arc<RoomMembership>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(membership: Arc<RoomMembership>) -> Self {
        Self { membership }
    }

    /// ルーム参加を実行（既に参加済みでも成功扱い）
    pub fn execute(
        &self,
        session: &HubSession,
        raw_room_id: String,
    ) -> Result<RoomKey, RoomMembershipError> {
        if !session.is_open() {
            return Err(RoomMembershipError::SessionClosed);
        }
        let room_key = RoomKey::new(raw_room_id).map_err(|_| RoomMembershipError::MissingRoomId)?;

        let joined = self.membership.join(&room_key, &session.connection_id);

        // 参加と並行して切断処理が走った場合、切断側の掃除の後に追加している可能性がある
        if !session.is_open() {
            if joined {
                self.membership.leave(&room_key, &session.connection_id);
            }
            return Err(RoomMembershipError::SessionClosed);
        }
        if joined {
            tracing::info!(
                "Connection '{}' joined room '{}'",
                session.connection_id,
                room_key
            );
        }
        Ok(room_key)
    }
}
