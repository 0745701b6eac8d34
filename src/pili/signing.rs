use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use hmac::{Hmac, Mac};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use super::PiliConfig;

type HmacSha1 = Hmac<Sha1>;

/// Access/secret key pair issued by the streaming hub.
#[derive(Clone)]
pub struct HubCredentials {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for HubCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .finish()
    }
}

impl HubCredentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// URL-safe base64 of HMAC-SHA1(secret_key, data).
    pub fn sign(&self, data: &[u8]) -> String {
        // HMAC accepts keys of any length.
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(data);
        URL_SAFE.encode(mac.finalize().into_bytes())
    }

    /// `<access_key>:<signature>`
    pub fn token(&self, data: &[u8]) -> String {
        format!("{}:{}", self.access_key, self.sign(data))
    }

    /// Value of the `Authorization` header for a management API request.
    pub fn management_authorization(
        &self,
        method: &str,
        path: &str,
        host: &str,
        body: &[u8],
    ) -> String {
        let mut data = format!("{method} {path}\nHost: {host}\nContent-Type: application/json\n\n")
            .into_bytes();
        data.extend_from_slice(body);
        format!("Qiniu {}", self.token(&data))
    }
}

/// Signed RTMP publish URL, valid until `expires_at` (Unix seconds).
pub fn rtmp_publish_url(
    domain: &str,
    hub: &str,
    key: &str,
    credentials: &HubCredentials,
    expires_at: i64,
) -> String {
    let path = format!("/{hub}/{key}?e={expires_at}");
    let token = credentials.token(path.as_bytes());
    format!("rtmp://{domain}{path}&token={token}")
}

pub fn rtmp_play_url(domain: &str, hub: &str, key: &str) -> String {
    format!("rtmp://{domain}/{hub}/{key}")
}

pub fn hls_play_url(domain: &str, hub: &str, key: &str) -> String {
    format!("http://{domain}/{hub}/{key}.m3u8")
}

pub fn hdl_play_url(domain: &str, hub: &str, key: &str) -> String {
    format!("http://{domain}/{hub}/{key}.flv")
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlayUrls {
    pub rtmp: String,
    pub hls: String,
    pub hdl: String,
}

/// Claims carried by a room token.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomClaims {
    pub iss: String,
    pub room: String,
    pub user: String,
    pub version: String,
    pub exp: usize,
}

/// Formats the hub URLs for one configured hub.
#[derive(Debug, Clone)]
pub struct UrlSigner {
    config: PiliConfig,
}

impl UrlSigner {
    pub fn new(config: PiliConfig) -> Self {
        Self { config }
    }

    pub fn publish_url(&self, key: &str, now: i64) -> String {
        let c = &self.config;
        rtmp_publish_url(
            &c.publish_domain,
            &c.hub,
            key,
            &c.credentials,
            now + c.publish_url_ttl,
        )
    }

    pub fn play_urls(&self, key: &str) -> PlayUrls {
        let c = &self.config;
        PlayUrls {
            rtmp: rtmp_play_url(&c.rtmp_play_domain, &c.hub, key),
            hls: hls_play_url(&c.hls_play_domain, &c.hub, key),
            hdl: hdl_play_url(&c.hdl_play_domain, &c.hub, key),
        }
    }

    /// HS256 token granting `user` access to `room`, signed with the hub secret.
    ///
    /// This is this server's own JWT format (`iss`, `room`, `user`, `version`,
    /// `exp`). It is not checked against the hub's room-token scheme, so
    /// clients that hand it to the hub directly may be rejected.
    pub fn room_token(
        &self,
        room: &str,
        user: &str,
        version: &str,
        now: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let c = &self.config;
        let claims = RoomClaims {
            iss: c.credentials.access_key.clone(),
            room: room.to_string(),
            user: user.to_string(),
            version: version.to_string(),
            exp: (now + c.room_token_expiry).max(0) as usize,
        };
        let header = Header::new(Algorithm::HS256);
        encode(
            &header,
            &claims,
            &EncodingKey::from_secret(c.credentials.secret_key.as_bytes()),
        )
    }
}
