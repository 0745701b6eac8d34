//! # Pili Module
//!
//! Client side of the live-streaming hub: room management over its signed
//! management API, and pure formatting of publish/play URLs and room tokens.
pub mod hub_client;
pub mod signing;

pub use hub_client::{HubError, PiliHubClient, RoomHub, RoomInfo, RoomStatus};
pub use signing::{HubCredentials, PlayUrls, UrlSigner};

/// Represents the configuration required for hub access.
///
/// # Fields
///
/// - `credentials`: access/secret key pair used for every signature.
/// - `hub`: the hub (app) name rooms and streams live under.
/// - `api_host`: base URL of the management API.
/// - `*_domain`: hosts used when formatting publish and play URLs.
/// - `publish_url_ttl`: seconds a publish URL stays valid.
/// - `room_token_expiry`: seconds a room token stays valid.
/// - `default_max_users`: room capacity when the client does not ask for one.
#[derive(Clone, Debug)]
pub struct PiliConfig {
    pub credentials: HubCredentials,
    pub hub: String,
    pub api_host: String,
    pub publish_domain: String,
    pub rtmp_play_domain: String,
    pub hls_play_domain: String,
    pub hdl_play_domain: String,
    pub publish_url_ttl: i64,
    pub room_token_expiry: i64,
    pub default_max_users: u32,
}

impl PiliConfig {
    /// Loads the hub configuration through `lookup` (normally `std::env::var`).
    ///
    /// # Returns
    ///
    /// A `PiliConfig`, or a `String` naming the first missing or invalid variable.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| format!("Missing {key} env var"));
        let number = |key: &str, default: i64| -> Result<i64, String> {
            match lookup(key) {
                Some(v) => v.parse::<i64>().map_err(|_| format!("Invalid {key}")),
                None => Ok(default),
            }
        };

        let default_max_users = match lookup("ROOM_DEFAULT_MAX_USERS") {
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| "Invalid ROOM_DEFAULT_MAX_USERS".to_string())?,
            None => 99,
        };

        Ok(Self {
            credentials: HubCredentials::new(
                required("PILI_ACCESS_KEY")?,
                required("PILI_SECRET_KEY")?,
            ),
            hub: required("PILI_HUB")?,
            api_host: lookup("PILI_API_HOST")
                .unwrap_or_else(|| "https://pili.qiniuapi.com".to_string()),
            publish_domain: required("PILI_PUBLISH_DOMAIN")?,
            rtmp_play_domain: required("PILI_RTMP_PLAY_DOMAIN")?,
            hls_play_domain: required("PILI_HLS_PLAY_DOMAIN")?,
            hdl_play_domain: required("PILI_HDL_PLAY_DOMAIN")?,
            publish_url_ttl: number("PUBLISH_URL_TTL", 3600)?,
            room_token_expiry: number("ROOM_TOKEN_EXPIRY", 3600)?,
            default_max_users,
        })
    }
}
