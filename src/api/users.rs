use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use serde::{Deserialize, Serialize};

use super::{AppState, MessageResponse};
use crate::accounts;
use crate::error::ApiError;
use crate::storage::{Account, StorageError};
use crate::utils::now_unix;

#[derive(Deserialize)]
pub struct NewUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub room: String,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub code: u16,
    pub name: String,
    pub room: String,
}

/// Credential tokens carry `name:password`, so neither part may hold a colon.
fn check_token_safe(fields: &[&str]) -> Result<(), ApiError> {
    if fields.iter().any(|field| field.contains(':')) {
        return Err(ApiError::Validation(
            "name or password must not contain ':'".into(),
        ));
    }
    Ok(())
}

/// Registers a user and creates their room.
pub async fn create_user(
    body: web::Json<NewUserRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    let body = body.into_inner();
    if body.name.is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation("name or password is null".into()));
    }
    if body.room.is_empty() {
        return Err(ApiError::Validation("room is null".into()));
    }
    check_token_safe(&[body.name.as_str(), body.password.as_str()])?;

    let account = Account::new(body.name, body.password, body.room, now_unix());
    accounts::create_account(
        state.store.as_ref(),
        state.hub.as_ref(),
        &account,
        state.default_max_users,
    )
    .await?;

    Ok(HttpResponse::Ok().json(UserResponse {
        code: 200,
        name: account.name,
        room: account.room,
    }))
}

pub async fn query_user(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    let name = path.into_inner();
    let account = state
        .store
        .find_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        code: 200,
        name: account.name,
        room: account.room,
    }))
}

/// Changes the caller's own password.
pub async fn update_user(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    let name = path.into_inner();
    state.authenticate_as(&req, &name).await?;
    if body.password.is_empty() {
        return Err(ApiError::Validation("password is null".into()));
    }
    check_token_safe(&[body.password.as_str()])?;

    // The account may have been deleted since it was authenticated.
    state
        .store
        .update_secret(&name, &body.password)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::NotFound("user not found".into()),
            other => other.into(),
        })?;
    tracing::info!(name = %name, "password updated");
    Ok(HttpResponse::Ok().json(MessageResponse::ok()))
}

/// Deletes the caller's own account and room.
pub async fn delete_user(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    let name = path.into_inner();
    state.authenticate_as(&req, &name).await?;

    accounts::delete_account(
        state.store.as_ref(),
        state.hub.as_ref(),
        &name,
        state.default_max_users,
    )
    .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok()))
}

pub async fn login(
    body: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    if body.name.is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation("name or password is null".into()));
    }
    state.authorizer.verify(&body.name, &body.password).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok()))
}
