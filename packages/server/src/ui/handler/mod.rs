//! HTTP / WebSocket handlers.

mod http;
mod websocket;

pub use http::{dispatch_notifications, get_presence, health_check};
pub use websocket::websocket_handler;
