use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use serde::Serialize;

use super::AppState;
use crate::error::ApiError;
use crate::pili::HubError;
use crate::utils::now_unix;

#[derive(Serialize)]
pub struct PublishResponse {
    pub code: u16,
    pub url: String,
}

#[derive(Serialize)]
pub struct PlayResponse {
    pub code: u16,
    pub rtmp: String,
    pub hls: String,
    pub hdl: String,
}

/// Makes sure the stream exists and hands out a signed publish URL.
pub async fn create_stream(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    state.authenticate(&req).await?;
    let key = path.into_inner();

    match state.hub.create_stream(&key).await {
        Ok(()) | Err(HubError::AlreadyExists(_)) => {}
        Err(e) => return Err(ApiError::Upstream(e)),
    }

    Ok(HttpResponse::Ok().json(PublishResponse {
        code: 200,
        url: state.urls.publish_url(&key, now_unix()),
    }))
}

pub async fn play_urls(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse, ApiError> {
    state.authenticate(&req).await?;
    let urls = state.urls.play_urls(&path);

    Ok(HttpResponse::Ok().json(PlayResponse {
        code: 200,
        rtmp: urls.rtmp,
        hls: urls.hls,
        hdl: urls.hdl,
    }))
}
