//! Tsunagi hub server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsunagi-server
//! cargo run --bin tsunagi-server -- --host 0.0.0.0 --port 3000 --utc-offset +09:00
//! ```

use std::sync::Arc;

use clap::Parser;
use tsunagi_server::{
    config::ServerConfig,
    domain::{ConnectionRegistry, PushProvider, RoomMembership},
    infrastructure::{
        dto::frame::JsonFrameFormatter,
        message_pusher::WebSocketMessagePusher,
        push::{DisabledPushProvider, FcmPushProvider},
        repository::{Fixtures, InMemoryChatRepository, InMemoryNotificationRepository},
    },
    ui::{AppState, Server, spawn_notification_sweep},
    usecase::{
        BroadcastCoordinatesUseCase, ConnectClientUseCase, DisconnectClientUseCase,
        DispatchNotificationsUseCase, JoinRoomUseCase, LeaveRoomUseCase, SendMessageUseCase,
        SweepNotificationsUseCase,
    },
};
use tsunagi_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Initialize dependencies in order:
    // 1. Clock / Repositories / PushProvider
    // 2. Presence + MessagePusher + FrameFormatter
    // 3. UseCases
    // 4. Sweep
    // 5. Server

    // 1. Clock, in-memory business collaborators and push provider
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.utc_offset));
    let chat_repository = Arc::new(InMemoryChatRepository::new());
    let notification_repository = Arc::new(InMemoryNotificationRepository::new());
    if let Some(path) = &config.fixtures {
        match Fixtures::from_path(path) {
            Ok(fixtures) => {
                fixtures
                    .apply(&chat_repository, &notification_repository)
                    .await
            }
            Err(e) => {
                tracing::error!("Failed to load fixtures from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }
    let push_provider: Arc<dyn PushProvider> = match config.push_credentials() {
        Some((endpoint, server_key)) => {
            tracing::info!("Push notifications enabled via {}", endpoint);
            Arc::new(FcmPushProvider::new(endpoint, server_key))
        }
        None => {
            tracing::warn!("Push endpoint not configured; external push is disabled");
            Arc::new(DisabledPushProvider)
        }
    };

    // 2. Presence, MessagePusher (WebSocket implementation) and frame formatter
    let registry = Arc::new(ConnectionRegistry::new());
    let membership = Arc::new(RoomMembership::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let frame_formatter = Arc::new(JsonFrameFormatter);

    // 3. Create UseCases
    let dispatch_notifications_usecase = Arc::new(DispatchNotificationsUseCase::new(
        notification_repository.clone(),
        registry.clone(),
        message_pusher.clone(),
        frame_formatter.clone(),
        push_provider,
        clock.clone(),
        config.push_timeout(),
    ));
    let state = AppState {
        connect_client_usecase: Arc::new(ConnectClientUseCase::new(
            registry.clone(),
            message_pusher.clone(),
            clock.clone(),
        )),
        disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(
            registry.clone(),
            membership.clone(),
            message_pusher.clone(),
        )),
        join_room_usecase: Arc::new(JoinRoomUseCase::new(membership.clone())),
        leave_room_usecase: Arc::new(LeaveRoomUseCase::new(membership.clone())),
        send_message_usecase: Arc::new(SendMessageUseCase::new(
            chat_repository,
            membership,
            registry.clone(),
            message_pusher.clone(),
            frame_formatter.clone(),
            dispatch_notifications_usecase.clone(),
            clock.clone(),
        )),
        broadcast_coordinates_usecase: Arc::new(BroadcastCoordinatesUseCase::new(
            registry.clone(),
            message_pusher,
            frame_formatter,
        )),
        dispatch_notifications_usecase: dispatch_notifications_usecase.clone(),
        registry,
    };

    // 4. Periodic sweep
    let sweep = config.sweep_interval().map(|period| {
        let usecase = Arc::new(SweepNotificationsUseCase::new(
            notification_repository,
            dispatch_notifications_usecase,
            clock,
        ));
        spawn_notification_sweep(usecase, period)
    });

    // 5. Create and run the server
    let server = Server::new(state);
    let result = server.run(config.host, config.port).await;

    if let Some(sweep) = sweep {
        sweep.abort();
    }
    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
