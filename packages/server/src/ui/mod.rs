//! UI layer: Axum router, WebSocket hub and HTTP API.

mod handler;
mod scheduler;
mod server;
mod signal;
pub mod state;

pub use scheduler::spawn_notification_sweep;
pub use server::Server;
pub use signal::shutdown_signal;
pub use state::AppState;
