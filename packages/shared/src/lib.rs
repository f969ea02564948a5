//! Tsunagi の server / テストで共有するユーティリティ
//!
//! - `logger`: tracing subscriber の初期化
//! - `time`: 設定されたタイムゾーンで現在時刻を返す Clock 抽象

pub mod logger;
pub mod time;
