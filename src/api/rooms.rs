use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use serde::{Deserialize, Serialize};

use super::{AppState, MessageResponse};
use crate::error::ApiError;
use crate::pili::HubError;
use crate::utils::now_unix;

#[derive(Deserialize)]
pub struct NewRoomRequest {
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub max: i64,
}

#[derive(Deserialize)]
pub struct RoomTokenRequest {
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatusResponse {
    pub code: u16,
    pub room: String,
    pub owner_id: String,
    pub user_max: u32,
    pub status: i32,
}

#[derive(Serialize)]
pub struct RoomCreatedResponse {
    pub code: u16,
    pub room: String,
}

fn room_error(room: &str, e: HubError) -> ApiError {
    match e {
        HubError::NotFound(_) => ApiError::NotFound(format!("room {room} not found")),
        HubError::AlreadyExists(_) => ApiError::Conflict(format!("room {room} already exists")),
        other => ApiError::Upstream(other),
    }
}

pub async fn query_room(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    let room = path.into_inner();
    let status = state
        .hub
        .room_status(&room)
        .await
        .map_err(|e| room_error(&room, e))?;

    Ok(HttpResponse::Ok().json(RoomStatusResponse {
        code: 200,
        room: status.room,
        owner_id: status.owner,
        user_max: status.max_users,
        status: status.status,
    }))
}

/// Creates a room owned by the caller.
pub async fn create_room(
    req: HttpRequest,
    body: web::Json<NewRoomRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    let body = body.into_inner();
    if body.room.is_empty() || body.user.is_empty() {
        return Err(ApiError::Validation("room or user is null".into()));
    }
    state.authenticate_as(&req, &body.user).await?;

    let max_users = u32::try_from(body.max)
        .ok()
        .filter(|m| *m > 0)
        .unwrap_or(state.default_max_users);
    let created = state
        .hub
        .create_room(&body.room, &body.user, max_users)
        .await
        .map_err(|e| room_error(&body.room, e))?;

    tracing::info!(room = %created.room, owner = %body.user, max_users, "room created");
    Ok(HttpResponse::Ok().json(RoomCreatedResponse {
        code: 200,
        room: created.room,
    }))
}

/// Deletes a room, only for its owner.
pub async fn delete_room(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    let room = path.into_inner();
    let principal = state.authenticate(&req).await?;

    let status = state
        .hub
        .room_status(&room)
        .await
        .map_err(|e| room_error(&room, e))?;
    if !principal.is(&status.owner) {
        return Err(ApiError::Forbidden("no authorized".into()));
    }

    state
        .hub
        .delete_room(&room)
        .await
        .map_err(|e| room_error(&room, e))?;
    tracing::info!(room = %room, owner = %principal, "room deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::ok()))
}

/// Issues a signed token letting `user` join `room`. Returned as plain text.
pub async fn room_token(
    req: HttpRequest,
    body: web::Json<RoomTokenRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    state.authenticate(&req).await?;
    if body.room.is_empty() || body.user.is_empty() {
        return Err(ApiError::Validation("room or user is null".into()));
    }

    let token = state
        .urls
        .room_token(&body.room, &body.user, &body.version, now_unix())
        .map_err(|e| ApiError::Upstream(HubError::Token(e)))?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(token))
}
