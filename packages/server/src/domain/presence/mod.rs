//! プレゼンス（接続・ルーム所属）の管理
//!
//! どちらも「キー → 集合」の並行マップで、キーごとのシャードロック（DashMap）を使う。
//! 全体を 1 つの Mutex で守ることはしない。読み取りは常にスナップショット（所有値）を返し、
//! `.await` をまたいでロックを保持しない。

mod connection_registry;
mod room_membership;

pub use connection_registry::ConnectionRegistry;
pub use room_membership::RoomMembership;
