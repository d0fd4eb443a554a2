// src/handlers/devices.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::device::{DeviceCommand, DeviceState},
    services::device_action_service::LocateStatus,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCommandResponse {
    pub device_id: Uuid,
    pub state: DeviceState,
}

// POST /api/devices/{id}/locate
#[utoipa::path(
    post,
    path = "/api/devices/{id}/locate",
    tag = "Devices",
    responses(
        (status = 202, description = "Localização solicitada; polling em andamento", body = LocateStatus),
        (status = 502, description = "Backend indisponível")
    ),
    params(("id" = Uuid, Path, description = "ID do aparelho")),
    security(("api_jwt" = []))
)]
pub async fn request_location(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(device_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .device_actions
        .locate(&user.token, device_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::ACCEPTED, Json(status)))
}

// DELETE /api/devices/{id}/locate
#[utoipa::path(
    delete,
    path = "/api/devices/{id}/locate",
    tag = "Devices",
    responses(
        (status = 204, description = "Polling de localização cancelado")
    ),
    params(("id" = Uuid, Path, description = "ID do aparelho")),
    security(("api_jwt" = []))
)]
pub async fn cancel_location(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(device_id): Path<Uuid>,
) -> impl IntoResponse {
    if app_state.device_actions.cancel_locate(device_id).await {
        tracing::info!(%device_id, "localização cancelada pelo operador");
    }
    StatusCode::NO_CONTENT
}

// GET /api/devices/{id}/location
#[utoipa::path(
    get,
    path = "/api/devices/{id}/location",
    tag = "Devices",
    responses(
        (status = 200, description = "Estado da última solicitação de localização", body = LocateStatus)
    ),
    params(("id" = Uuid, Path, description = "ID do aparelho")),
    security(("api_jwt" = []))
)]
pub async fn get_location(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(device_id): Path<Uuid>,
) -> impl IntoResponse {
    let status = app_state.device_actions.location_status(device_id).await;
    (StatusCode::OK, Json(status))
}

async fn send_command(
    app_state: &AppState,
    locale: &Locale,
    user: &AuthenticatedUser,
    device_id: Uuid,
    command: DeviceCommand,
) -> Result<Json<DeviceCommandResponse>, ApiError> {
    let state = app_state
        .device_actions
        .send_command(&user.token, device_id, command)
        .await
        .map_err(|e| e.to_api_error(locale))?;

    Ok(Json(DeviceCommandResponse { device_id, state }))
}

// POST /api/devices/{id}/block
#[utoipa::path(
    post,
    path = "/api/devices/{id}/block",
    tag = "Devices",
    responses(
        (status = 200, description = "Aparelho bloqueado", body = DeviceCommandResponse),
        (status = 502, description = "Backend indisponível ou aparelho desconhecido")
    ),
    params(("id" = Uuid, Path, description = "ID do aparelho")),
    security(("api_jwt" = []))
)]
pub async fn block_device(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(device_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    send_command(&app_state, &locale, &user, device_id, DeviceCommand::Block).await
}

// POST /api/devices/{id}/unblock
#[utoipa::path(
    post,
    path = "/api/devices/{id}/unblock",
    tag = "Devices",
    responses(
        (status = 200, description = "Aparelho desbloqueado", body = DeviceCommandResponse),
        (status = 502, description = "Backend indisponível ou aparelho desconhecido")
    ),
    params(("id" = Uuid, Path, description = "ID do aparelho")),
    security(("api_jwt" = []))
)]
pub async fn unblock_device(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(device_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    send_command(&app_state, &locale, &user, device_id, DeviceCommand::Unblock).await
}
