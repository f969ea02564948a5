//! Infrastructure 層
//!
//! - `dto`: WebSocket / HTTP のワイヤーフォーマット
//! - `message_pusher`: セッション内送信（WebSocket）
//! - `push`: 外部プッシュプロバイダー
//! - `repository`: 業務レイヤーのコラボレーター（インメモリ実装）

pub mod dto;
pub mod message_pusher;
pub mod push;
pub mod repository;
