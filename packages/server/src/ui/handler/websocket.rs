//! WebSocket connection handlers (the hub transport).

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{DisconnectReason, HubSession, PusherChannel},
    infrastructure::dto::websocket::{ClientMessage, ServerMessage},
    ui::state::AppState,
    usecase::SendMessageCommand,
};

/// Header set by the upstream auth gateway
pub const USER_KEY_HEADER: &str = "x-user-key";

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(default)]
    pub user_key: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // A missing identity never fails the upgrade; the session runs untracked.
    let raw_user_key = query.user_key.or_else(|| {
        headers
            .get(USER_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    });

    ws.on_upgrade(move |socket| handle_socket(socket, state, raw_user_key))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver fed through the `MessagePusher`
/// * `sender` - WebSocket sink to send messages to this client
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Queue a server frame for this connection
fn reply(channel: &PusherChannel, message: ServerMessage) {
    if let Some(json) = message.to_json()
        && channel.send(json).is_err()
    {
        tracing::debug!("Reply dropped: connection already closing");
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, raw_user_key: Option<String>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let session = state
        .connect_client_usecase
        .execute(raw_user_key, tx.clone())
        .await;

    // The connected frame goes out before anything queued through the pusher.
    let connected = ServerMessage::Connected {
        connection_id: session.connection_id.to_string(),
        user_key: session.user_key().map(|key| key.to_string()),
    };
    if let Some(json) = connected.to_json()
        && let Err(e) = sender.send(Message::Text(json.into())).await
    {
        tracing::warn!(
            "Failed to send connected frame to '{}': {}",
            session.connection_id,
            e
        );
        state
            .disconnect_client_usecase
            .execute(&session, DisconnectReason::TransportError(e.to_string()))
            .await;
        return;
    }

    let recv_state = state.clone();
    let recv_session = session.clone();
    let reply_channel = tx;

    // Spawn a task to receive frames from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => return DisconnectReason::TransportError(e.to_string()),
            };

            match msg {
                Message::Text(text) => {
                    handle_client_frame(&recv_state, &recv_session, &reply_channel, text.as_str())
                        .await;
                }
                Message::Binary(_) => {
                    reply(
                        &reply_channel,
                        ServerMessage::error("binary frames are not supported"),
                    );
                }
                Message::Close(_) => return DisconnectReason::ClientClosed,
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
        DisconnectReason::ClientClosed
    });

    // Spawn a task to push queued frames to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    let reason = tokio::select! {
        result = &mut recv_task => {
            send_task.abort();
            let _ = (&mut send_task).await;
            result.unwrap_or_else(|e| DisconnectReason::TransportError(e.to_string()))
        }
        _ = &mut send_task => {
            recv_task.abort();
            // A frame still being handled must finish (or be cancelled) before the sweep.
            let _ = (&mut recv_task).await;
            DisconnectReason::SendLoopEnded
        }
    };

    state
        .disconnect_client_usecase
        .execute(&session, reason)
        .await;
}

/// Handle one inbound text frame. Malformed frames get an error frame; the socket stays open.
async fn handle_client_frame(
    state: &AppState,
    session: &HubSession,
    reply_channel: &PusherChannel,
    text: &str,
) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(
                "Malformed frame from '{}': {}",
                session.connection_id,
                e
            );
            reply(
                reply_channel,
                ServerMessage::error(format!("malformed frame: {}", e)),
            );
            return;
        }
    };

    match message {
        ClientMessage::JoinRoom { room_id } => {
            match state.join_room_usecase.execute(session, room_id) {
                Ok(room_key) => reply(
                    reply_channel,
                    ServerMessage::RoomJoined {
                        room_id: room_key.as_str().to_string(),
                    },
                ),
                Err(e) => reply(reply_channel, ServerMessage::error(e.to_string())),
            }
        }
        ClientMessage::LeaveRoom { room_id } => {
            match state.leave_room_usecase.execute(session, room_id) {
                Ok((room_key, _)) => reply(
                    reply_channel,
                    ServerMessage::RoomLeft {
                        room_id: room_key.as_str().to_string(),
                    },
                ),
                Err(e) => reply(reply_channel, ServerMessage::error(e.to_string())),
            }
        }
        ClientMessage::SendMessage {
            room_id,
            content,
            sender_display_name,
        } => {
            let command = SendMessageCommand {
                room_id,
                sender: session.user_key(),
                sender_display_name,
                content,
            };
            match state.send_message_usecase.execute(command).await {
                Ok(outcome) => {
                    tracing::debug!(
                        "Message {} stored in room {}: {:?}",
                        outcome.message_id.value(),
                        outcome.room_id.value(),
                        outcome.status
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to send message from '{}': {}",
                        session.connection_id,
                        e
                    );
                    reply(reply_channel, ServerMessage::error(e.to_string()));
                }
            }
        }
        ClientMessage::SendCoordinates {
            observer_keys,
            payload,
        } => {
            let report = state
                .broadcast_coordinates_usecase
                .execute(session.user_key().as_ref(), observer_keys, payload)
                .await;
            tracing::debug!(
                "Coordinates from '{}' delivered={}, failed={}",
                session.connection_id,
                report.delivered,
                report.failed
            );
        }
    }
}
