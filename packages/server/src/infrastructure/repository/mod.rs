//! Repository の実装
//!
//! ## 概要
//!
//! このモジュールは Domain 層が定義する `ChatRepository` / `NotificationRepository`
//! trait の具体的な実装を提供します。
//!
//! ## 実装
//!
//! - `inmemory`: インメモリ実装（業務レイヤーの代替。開発・テスト用）

pub mod inmemory;

pub use inmemory::{
    FixtureError, Fixtures, InMemoryChatRepository, InMemoryNotificationRepository,
};
