//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::ConnectionRegistry,
    usecase::{
        BroadcastCoordinatesUseCase, ConnectClientUseCase, DisconnectClientUseCase,
        DispatchNotificationsUseCase, JoinRoomUseCase, LeaveRoomUseCase, SendMessageUseCase,
    },
};

/// Shared application state
///
/// Holds the use cases invoked by the hub and the HTTP API.
pub struct AppState {
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub broadcast_coordinates_usecase: Arc<BroadcastCoordinatesUseCase>,
    pub dispatch_notifications_usecase: Arc<DispatchNotificationsUseCase>,
    /// Live presence (read-only from the HTTP API)
    pub registry: Arc<ConnectionRegistry>,
}
