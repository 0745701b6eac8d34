//! # API Module
//!
//! HTTP routes under `/pili/v1`. Handlers are thin: they authenticate,
//! check ownership, and call into [`crate::accounts`] or the hub.
pub mod rooms;
pub mod streams;
pub mod users;

use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;

use crate::auth::{bearer_token, Authorizer, Principal};
use crate::error::ApiError;
use crate::pili::{PiliConfig, RoomHub, UrlSigner};
use crate::storage::AccountStore;

/// Everything a handler needs, injected once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub hub: Arc<dyn RoomHub>,
    pub authorizer: Authorizer,
    pub urls: UrlSigner,
    pub default_max_users: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn AccountStore>, hub: Arc<dyn RoomHub>, pili: PiliConfig) -> Self {
        Self {
            authorizer: Authorizer::new(store.clone()),
            default_max_users: pili.default_max_users,
            urls: UrlSigner::new(pili),
            store,
            hub,
        }
    }

    /// Runs the authorizer on the request's `Authorization` header.
    pub async fn authenticate(&self, req: &HttpRequest) -> Result<Principal, ApiError> {
        let token = bearer_token(req).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected authorization header");
        })?;
        Ok(self.authorizer.authorize(token).await?)
    }

    /// Like [`authenticate`](Self::authenticate), but also requires the
    /// principal to be `owner`.
    pub async fn authenticate_as(
        &self,
        req: &HttpRequest,
        owner: &str,
    ) -> Result<Principal, ApiError> {
        let principal = self.authenticate(req).await?;
        if !principal.is(owner) {
            tracing::warn!(principal = %principal, owner, "principal does not own resource");
            return Err(ApiError::Forbidden(
                "name and authentication are inconsistent".to_string(),
            ));
        }
        Ok(principal)
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub code: u16,
    pub message: &'static str,
}

impl MessageResponse {
    pub fn ok() -> Self {
        Self {
            code: 200,
            message: "ok",
        }
    }
}

/// Health probe.
pub async fn server_status() -> impl Responder {
    HttpResponse::Ok().json(MessageResponse {
        code: 200,
        message: "success",
    })
}

/// Registers every route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/pili/v1")
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                ApiError::Validation(format!("the request's parameter error: {err}")).into()
            }))
            .route("/server", web::get().to(server_status))
            .route("/user/new", web::post().to(users::create_user))
            .route("/user/query/{name}", web::get().to(users::query_user))
            .route("/user/update/{name}", web::post().to(users::update_user))
            .route("/user/delete/{name}", web::post().to(users::delete_user))
            .route("/login", web::post().to(users::login))
            .route("/room/query/{id}", web::get().to(rooms::query_room))
            .route("/room/new", web::post().to(rooms::create_room))
            .route("/room/delete/{id}", web::post().to(rooms::delete_room))
            .route("/room/token", web::post().to(rooms::room_token))
            .route("/stream/query/{id}", web::get().to(streams::play_urls))
            .route("/stream/{id}", web::post().to(streams::create_stream)),
    );
}
