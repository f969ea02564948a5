//! UseCase 層
//!
//! Hub から呼ばれる操作（接続・切断・ルーム参加・チャット送信・座標ブロードキャスト）と、
//! 通知ディスパッチ（同期トリガー / 定期スイープ）をまとめる。

mod broadcast_coordinates;
mod connect_client;
mod disconnect_client;
mod dispatch_notifications;
mod error;
mod join_room;
mod leave_room;
mod send_message;
mod sweep_notifications;

pub use broadcast_coordinates::BroadcastCoordinatesUseCase;
pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use dispatch_notifications::DispatchNotificationsUseCase;
pub use error::{RoomMembershipError, SendMessageError};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use send_message::{ChatDeliveryStatus, SendMessageCommand, SendMessageOutcome, SendMessageUseCase};
pub use sweep_notifications::SweepNotificationsUseCase;
