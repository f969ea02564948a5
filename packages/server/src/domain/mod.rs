//! Domain 層
//!
//! - Value Object / Entity
//! - プレゼンス（接続・ルーム所属）
//! - セッションの状態遷移
//! - 通知文面の組み立て（純粋関数）
//! - 外部コラボレーターの trait（Repository / MessagePusher / PushProvider / FrameFormatter）

pub mod composer;
pub mod entity;
pub mod error;
pub mod frame;
pub mod message_pusher;
pub mod notification;
pub mod presence;
pub mod push_provider;
pub mod repository;
pub mod session;
pub mod value_object;

pub use composer::NotificationComposer;
pub use entity::{
    ChatMessage, ChatRoom, NotificationEvent, NotificationLogEntry, PersistedMessage,
};
pub use error::{MessagePushError, PushError, RepositoryError, ValueObjectError};
pub use frame::FrameFormatter;
pub use message_pusher::{BroadcastReport, MessagePusher, PusherChannel, push_to_each};
pub use notification::{
    AssignmentSummary, AssignmentType, Channel, Checkpoint, DispatchReport, EventType,
    NotificationContent, PushTarget, RecipientType, TripLeg,
};
pub use presence::{ConnectionRegistry, RoomMembership};
pub use push_provider::{PushProvider, PushReceipt};
pub use repository::{ChatRepository, NotificationRepository};
pub use session::{DisconnectReason, HubSession, SessionState, SessionTransitionError};
pub use value_object::{
    AssignmentId, ConnectionId, ConnectionIdFactory, MessageContent, MessageId, RoomId, RoomKey,
    Timestamp, UserKey,
};
