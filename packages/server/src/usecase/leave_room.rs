//! UseCase: ルーム退出処理

use std::sync::Arc;

use crate::domain::{HubSession, RoomKey, RoomMembership};

use super::error::RoomMembershipError;

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    membership: Arc<RoomMembership>,
}

impl LeaveRoomUseCase {
    pub fn new(membership: Arc<RoomMembership>) -> Self {
        Self { membership }
    }

    /// ルーム退出を実行
    ///
    /// # Returns
    ///
    /// 退出したルームと、実際に参加していたかどうか（未参加なら何もしない）
    pub fn execute(
        &self,
        session: &HubSession,
        raw_room_id: String,
    ) -> Result<(RoomKey, bool), RoomMembershipError> {
        if !session.is_open() {
            return Err(RoomMembershipError::SessionClosed);
        }
        let room_key = RoomKey::new(raw_room_id).map_err(|_| RoomMembershipError::MissingRoomId)?;

        let left = self.membership.leave(&room_key, &session.connection_id);
        if left {
            tracing::info!(
                "Connection '{}' left room '{}'",
                session.connection_id,
                room_key
            );
        }
        Ok((room_key, left))
    }
}
