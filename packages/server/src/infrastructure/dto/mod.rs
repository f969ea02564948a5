//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs
//! - `http`: HTTP API request / response DTOs
//!
//! `frame` implements the domain `FrameFormatter` on top of the WebSocket DTOs.

pub mod conversion;
pub mod frame;
pub mod http;
pub mod websocket;
