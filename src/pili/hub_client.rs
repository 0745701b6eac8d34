use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{HubCredentials, PiliConfig};

#[derive(Error, Debug)]
pub enum HubError {
    #[error("hub request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0} not found on hub")]
    NotFound(String),
    #[error("{0} already exists on hub")]
    AlreadyExists(String),
    #[error("hub rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("failed to sign room token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    #[serde(rename = "room_name")]
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStatus {
    #[serde(rename = "room_name")]
    pub room: String,
    #[serde(rename = "owner_id")]
    pub owner: String,
    #[serde(rename = "user_max")]
    pub max_users: u32,
    #[serde(default)]
    pub status: i32,
}

/// Room and stream management on the streaming hub.
///
/// Shared by every request and the sweeper; implementations synchronize
/// internally.
pub trait RoomHub: Send + Sync {
    fn create_room<'a>(
        &'a self,
        name: &'a str,
        owner: &'a str,
        max_users: u32,
    ) -> BoxFuture<'a, Result<RoomInfo, HubError>>;

    fn delete_room<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), HubError>>;

    fn room_status<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<RoomStatus, HubError>>;

    fn create_stream<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), HubError>>;
}

#[derive(Serialize)]
struct CreateRoomBody<'a> {
    room_name: &'a str,
    owner_id: &'a str,
    user_max: u32,
}

#[derive(Serialize)]
struct CreateStreamBody<'a> {
    key: &'a str,
}

#[derive(Deserialize)]
struct HubErrorBody {
    error: String,
}

/// [`RoomHub`] backed by the hub's signed JSON management API.
#[derive(Clone, Debug)]
pub struct PiliHubClient {
    http: Client,
    credentials: HubCredentials,
    api_host: String,
    hub: String,
}

impl PiliHubClient {
    pub fn new(http: Client, config: &PiliConfig) -> Self {
        Self {
            http,
            credentials: config.credentials.clone(),
            api_host: config.api_host.trim_end_matches('/').to_string(),
            hub: config.hub.clone(),
        }
    }

    fn host(&self) -> &str {
        let without_scheme = self
            .api_host
            .split_once("://")
            .map_or(self.api_host.as_str(), |(_, rest)| rest);
        without_scheme.split('/').next().unwrap_or(without_scheme)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        resource: &str,
    ) -> Result<reqwest::Response, HubError> {
        let payload = body.unwrap_or_default();
        let authorization = self.credentials.management_authorization(
            method.as_str(),
            path,
            self.host(),
            &payload,
        );

        let mut request = self
            .http
            .request(method, format!("{}{}", self.api_host, path))
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if !payload.is_empty() {
            request = request.body(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<HubErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        tracing::debug!(%status, %message, resource, "hub returned an error");
        Err(map_status(status, resource, message))
    }
}

fn map_status(status: StatusCode, resource: &str, message: String) -> HubError {
    match status.as_u16() {
        404 | 612 => HubError::NotFound(resource.to_string()),
        409 | 614 => HubError::AlreadyExists(resource.to_string()),
        code => HubError::Rejected {
            status: code,
            message,
        },
    }
}

fn to_json<T: Serialize>(value: &T) -> Vec<u8> {
    // Serializing these plain structs cannot fail.
    serde_json::to_vec(value).unwrap_or_default()
}

impl RoomHub for PiliHubClient {
    fn create_room<'a>(
        &'a self,
        name: &'a str,
        owner: &'a str,
        max_users: u32,
    ) -> BoxFuture<'a, Result<RoomInfo, HubError>> {
        async move {
            let path = format!("/v2/apps/{}/rooms", self.hub);
            let body = to_json(&CreateRoomBody {
                room_name: name,
                owner_id: owner,
                user_max: max_users,
            });
            let response = self
                .send(Method::POST, &path, Some(body), &format!("room {name}"))
                .await?;
            Ok(response.json::<RoomInfo>().await?)
        }
        .boxed()
    }

    fn delete_room<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), HubError>> {
        async move {
            let path = format!("/v2/apps/{}/rooms/{}", self.hub, name);
            self.send(Method::DELETE, &path, None, &format!("room {name}"))
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn room_status<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<RoomStatus, HubError>> {
        async move {
            let path = format!("/v2/apps/{}/rooms/{}", self.hub, name);
            let response = self
                .send(Method::GET, &path, None, &format!("room {name}"))
                .await?;
            Ok(response.json::<RoomStatus>().await?)
        }
        .boxed()
    }

    fn create_stream<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), HubError>> {
        async move {
            let path = format!("/v2/hubs/{}/streams", self.hub);
            let body = to_json(&CreateStreamBody { key });
            self.send(Method::POST, &path, Some(body), &format!("stream {key}"))
                .await?;
            Ok(())
        }
        .boxed()
    }
}
