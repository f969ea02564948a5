//! Tsunagi hub library.
//!
//! Real-time presence, room messaging and notification dispatch over WebSocket,
//! with a synchronous HTTP trigger and a periodic sweep for notifications.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
