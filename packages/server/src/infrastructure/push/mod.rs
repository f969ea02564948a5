//! 外部プッシュ通知の実装
//!
//! ## 実装
//!
//! - `fcm`: FCM 形式の HTTP API へ送信する実装
//! - `disabled`: 送信先が設定されていない場合の実装（常に NotConfigured）

pub mod disabled;
pub mod fcm;

pub use disabled::DisabledPushProvider;
pub use fcm::FcmPushProvider;
