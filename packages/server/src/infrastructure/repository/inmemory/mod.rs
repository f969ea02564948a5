//! インメモリ Repository 実装

pub mod chat;
pub mod fixtures;
pub mod notification;

pub use chat::InMemoryChatRepository;
pub use fixtures::{FixtureError, Fixtures};
pub use notification::InMemoryNotificationRepository;
