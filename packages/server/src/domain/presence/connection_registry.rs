//! ConnectionRegistry: ユーザー → 開いている接続の集合
//!
//! 1 ユーザーが複数のタブ・端末から同時に接続できる。

use std::collections::HashSet;

use dashmap::DashMap;

use crate::domain::value_object::{ConnectionId, UserKey};

/// ユーザーごとの接続集合
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Key: UserKey, Value: そのユーザーの接続
    connections: DashMap<UserKey, HashSet<ConnectionId>>,
    /// 逆引き（接続 → 所有ユーザー）
    owners: DashMap<ConnectionId, UserKey>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続を追加する（同じ組の再追加は何もしない）
    pub fn add(&self, user_key: &UserKey, connection_id: &ConnectionId) {
        let inserted = self
            .connections
            .entry(user_key.clone())
            .or_default()
            .insert(connection_id.clone());
        self.owners.insert(connection_id.clone(), user_key.clone());

        if inserted {
            tracing::debug!(
                "Connection '{}' added for user '{}'",
                connection_id,
                user_key
            );
        }
    }

    /// 接続を削除する（存在しない組の削除は何もしない）
    pub fn remove(&self, user_key: &UserKey, connection_id: &ConnectionId) {
        let removed = match self.connections.get_mut(user_key) {
            Some(mut set) => set.remove(connection_id),
            None => false,
        };
        // 空になったユーザーのエントリを掃除
        self.connections.remove_if(user_key, |_, set| set.is_empty());
        self.owners
            .remove_if(connection_id, |_, owner| owner == user_key);

        if removed {
            tracing::debug!(
                "Connection '{}' removed for user '{}'",
                connection_id,
                user_key
            );
        }
    }

    /// ユーザーの接続のスナップショット（ソート済み、存在しなければ空）
    pub fn connections(&self, user_key: &UserKey) -> Vec<ConnectionId> {
        let mut snapshot: Vec<ConnectionId> = self
            .connections
            .get(user_key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        snapshot.sort();
        snapshot
    }

    /// 接続を所有しているユーザー
    pub fn user_of(&self, connection_id: &ConnectionId) -> Option<UserKey> {
        self.owners.get(connection_id).map(|owner| owner.value().clone())
    }

    pub fn is_online(&self, user_key: &UserKey) -> bool {
        self.connections
            .get(user_key)
            .is_some_and(|set| !set.is_empty())
    }

    pub fn connection_count(&self, user_key: &UserKey) -> usize {
        self.connections.get(user_key).map_or(0, |set| set.len())
    }

    /// 接続中のユーザー数
    pub fn online_user_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn user(key: &str) -> UserKey {
        UserKey::new(key.to_string()).unwrap()
    }

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_add_is_idempotent() {
        // テスト項目: 同じ (user, conn) を 2 回追加しても 1 件だけ保持される
        // given (前提条件):
        let registry = ConnectionRegistry::new();

        // when (操作):
        registry.add(&user("U1"), &conn("c1"));
        registry.add(&user("U1"), &conn("c1"));

        // then (期待する結果):
        assert_eq!(registry.connections(&user("U1")), vec![conn("c1")]);
    }

    #[test]
    fn test_multiple_connections_per_user() {
        // テスト項目: 1 ユーザーが複数の接続を持てる
        // given (前提条件):
        let registry = ConnectionRegistry::new();

        // when (操作):
        registry.add(&user("U1"), &conn("c2"));
        registry.add(&user("U1"), &conn("c1"));

        // then (期待する結果):
        assert_eq!(
            registry.connections(&user("U1")),
            vec![conn("c1"), conn("c2")]
        );
        assert_eq!(registry.connection_count(&user("U1")), 2);
        assert_eq!(registry.user_of(&conn("c2")), Some(user("U1")));
    }

    #[test]
    fn test_remove_excludes_connection() {
        // テスト項目: remove 後は該当接続が含まれない
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        registry.add(&user("U1"), &conn("c1"));
        registry.add(&user("U1"), &conn("c2"));

        // when (操作):
        registry.remove(&user("U1"), &conn("c1"));

        // then (期待する結果):
        assert_eq!(registry.connections(&user("U1")), vec![conn("c2")]);
        assert_eq!(registry.user_of(&conn("c1")), None);
        assert!(registry.is_online(&user("U1")));
    }

    #[test]
    fn test_remove_last_connection_drops_user() {
        // テスト項目: 最後の接続を削除するとユーザーはオフライン扱い
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        registry.add(&user("U1"), &conn("c1"));

        // when (操作):
        registry.remove(&user("U1"), &conn("c1"));

        // then (期待する結果):
        assert!(!registry.is_online(&user("U1")));
        assert_eq!(registry.online_user_count(), 0);
        assert!(registry.connections(&user("U1")).is_empty());
    }

    #[test]
    fn test_remove_nonexistent_is_noop() {
        // テスト項目: 存在しない組の削除はエラーにならず、他の接続に影響しない
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        registry.add(&user("U1"), &conn("c1"));

        // when (操作):
        registry.remove(&user("U2"), &conn("c1"));
        registry.remove(&user("U1"), &conn("missing"));

        // then (期待する結果):
        assert_eq!(registry.connections(&user("U1")), vec![conn("c1")]);
        assert_eq!(registry.user_of(&conn("c1")), Some(user("U1")));
    }

    #[test]
    fn test_unknown_user_has_no_connections() {
        // テスト項目: 未登録ユーザーの接続は空
        let registry = ConnectionRegistry::new();
        assert!(registry.connections(&user("nobody")).is_empty());
        assert_eq!(registry.connection_count(&user("nobody")), 0);
    }

    #[tokio::test]
    async fn test_concurrent_add_and_remove() {
        // テスト項目: 並行に add / remove しても整合性が保たれる
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());

        // when (操作): 10 ユーザー × 20 接続を並行追加し、偶数番だけ削除
        let mut handles = Vec::new();
        for u in 0..10 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let user_key = user(&format!("U{}", u));
                for c in 0..20 {
                    registry.add(&user_key, &conn(&format!("U{}-c{}", u, c)));
                }
                for c in (0..20).step_by(2) {
                    registry.remove(&user_key, &conn(&format!("U{}-c{}", u, c)));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // then (期待する結果):
        for u in 0..10 {
            assert_eq!(registry.connection_count(&user(&format!("U{}", u))), 10);
        }
    }
}
