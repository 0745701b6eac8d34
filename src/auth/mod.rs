//! # Auth Module
//!
//! Credential tokens are `base64("<name>:<secret>")`, sent as the raw value of
//! the `Authorization` header. Every check goes back to the account store.
pub mod authorizer;

pub use authorizer::{
    decode_credential, encode_credential, AuthError, Authorizer, Credential, Principal,
};

use actix_web::{http::header, HttpRequest};

/// Extracts the credential token from the `Authorization` header.
///
/// A missing header yields an empty token; a value that is not visible ASCII
/// is malformed. A leading `Bearer` or `Basic` scheme word is dropped.
pub fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok("");
    };
    let raw = value
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?
        .trim();
    Ok(strip_scheme(raw))
}

fn strip_scheme(raw: &str) -> &str {
    match raw.split_once(' ') {
        Some((scheme, rest))
            if scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("basic") =>
        {
            rest.trim_start()
        }
        _ => raw,
    }
}
