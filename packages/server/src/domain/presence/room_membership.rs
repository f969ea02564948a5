//! RoomMembership: ルーム → 購読中の接続の集合
//!
//! 接続の識別とは独立に管理する。切断時は `remove_connection_from_all_rooms` で
//! その接続が参加していた全ルームから取り除く（ConnectionRegistry からの削除より先に呼ぶ）。

use std::collections::HashSet;

use dashmap::DashMap;

use crate::domain::value_object::{ConnectionId, RoomKey};

/// ルームごとの接続集合
#[derive(Debug, Default)]
pub struct RoomMembership {
    /// Key: RoomKey, Value: ルームに参加している接続
    members: DashMap<RoomKey, HashSet<ConnectionId>>,
    /// 逆引き（接続 → 参加しているルーム）。切断時の掃除に使う
    rooms_of: DashMap<ConnectionId, HashSet<RoomKey>>,
}

impl RoomMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// ルームに参加する
    ///
    /// # Returns
    ///
    /// 新規に参加した場合 `true`、既に参加済みなら `false`
    pub fn join(&self, room_key: &RoomKey, connection_id: &ConnectionId) -> bool {
        let inserted = self
            .members
            .entry(room_key.clone())
            .or_default()
            .insert(connection_id.clone());
        self.rooms_of
            .entry(connection_id.clone())
            .or_default()
            .insert(room_key.clone());

        if inserted {
            tracing::debug!("Connection '{}' joined room '{}'", connection_id, room_key);
        }
        inserted
    }

    /// ルームから退出する（未参加なら何もしない）
    ///
    /// # Returns
    ///
    /// 実際に退出した場合 `true`
    pub fn leave(&self, room_key: &RoomKey, connection_id: &ConnectionId) -> bool {
        let removed = match self.members.get_mut(room_key) {
            Some(mut set) => set.remove(connection_id),
            None => false,
        };
        self.members.remove_if(room_key, |_, set| set.is_empty());

        if let Some(mut rooms) = self.rooms_of.get_mut(connection_id) {
            rooms.remove(room_key);
        }
        self.rooms_of
            .remove_if(connection_id, |_, rooms| rooms.is_empty());

        if removed {
            tracing::debug!("Connection '{}' left room '{}'", connection_id, room_key);
        }
        removed
    }

    /// ルームに参加している接続のスナップショット（ソート済み）
    pub fn members(&self, room_key: &RoomKey) -> Vec<ConnectionId> {
        let mut snapshot: Vec<ConnectionId> = self
            .members
            .get(room_key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        snapshot.sort();
        snapshot
    }

    /// 接続が参加しているルームのスナップショット（ソート済み）
    pub fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomKey> {
        let mut snapshot: Vec<RoomKey> = self
            .rooms_of
            .get(connection_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        snapshot.sort();
        snapshot
    }

    /// 接続を全ルームから取り除く
    ///
    /// # Returns
    ///
    /// 取り除かれたルームの一覧
    pub fn remove_connection_from_all_rooms(&self, connection_id: &ConnectionId) -> Vec<RoomKey> {
        let mut rooms: Vec<RoomKey> = self
            .rooms_of
            .remove(connection_id)
            .map(|(_, rooms)| rooms.into_iter().collect())
            .unwrap_or_default();
        rooms.sort();

        for room_key in &rooms {
            if let Some(mut set) = self.members.get_mut(room_key) {
                set.remove(connection_id);
            }
            self.members.remove_if(room_key, |_, set| set.is_empty());
        }

        if !rooms.is_empty() {
            tracing::debug!(
                "Connection '{}' removed from {} room(s)",
                connection_id,
                rooms.len()
            );
        }
        rooms
    }

    /// メンバーが 1 人以上いるルーム数
    pub fn room_count(&self) -> usize {
        self.members.len()
    }

    /// 接続がどこかのルームに残っているか
    pub fn references(&self, connection_id: &ConnectionId) -> bool {
        self.members
            .iter()
            .any(|entry| entry.value().contains(connection_id))
    }
}
