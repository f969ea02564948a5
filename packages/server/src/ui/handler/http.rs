//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{NotificationEvent, UserKey},
    infrastructure::dto::http::{DispatchReportDto, DispatchRequestDto, PresenceDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Synchronous dispatch trigger from the business layer
///
/// Per-event and per-recipient failures are reported in the body, never as an
/// error status.
pub async fn dispatch_notifications(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DispatchRequestDto>,
) -> (StatusCode, Json<DispatchReportDto>) {
    // DTO から Domain Model への変換
    let events: Vec<NotificationEvent> = request.events.into_iter().map(Into::into).collect();

    let report = state.dispatch_notifications_usecase.execute(events).await;

    (StatusCode::ACCEPTED, Json(report.into()))
}

/// Live presence of a user
pub async fn get_presence(
    State(state): State<Arc<AppState>>,
    Path(user_key): Path<String>,
) -> Result<Json<PresenceDto>, StatusCode> {
    let user_key = UserKey::new(user_key).map_err(|_| StatusCode::BAD_REQUEST)?;
    let connections = state.registry.connection_count(&user_key);

    Ok(Json(PresenceDto {
        user_key: user_key.into_string(),
        online: connections > 0,
        connections,
    }))
}
