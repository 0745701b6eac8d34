use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::storage::{AccountStore, StorageError};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("authorization is missing")]
    MissingCredential,
    #[error("authorization is malformed")]
    MalformedCredential,
    #[error("name or password is wrong")]
    InvalidCredential,
    #[error("account lookup failed: {0}")]
    Storage(#[from] StorageError),
}

/// The identity behind a credential that was checked against the store.
///
/// Only the [`Authorizer`] constructs these, so holding one means the
/// name/secret pair matched at the time of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(String);

impl Principal {
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Whether this principal is the owner called `name`.
    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The decoded but not yet verified content of a credential token.
#[derive(Debug, PartialEq, Eq)]
pub struct Credential {
    pub identity: String,
    pub secret: String,
}

/// Decodes `base64("<identity>:<secret>")`.
pub fn decode_credential(token: &str) -> Result<Credential, AuthError> {
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    let bytes = STANDARD
        .decode(token)
        .map_err(|_| AuthError::MalformedCredential)?;
    let payload = String::from_utf8(bytes).map_err(|_| AuthError::MalformedCredential)?;

    let mut parts = payload.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(identity), Some(secret), None) if !identity.is_empty() && !secret.is_empty() => {
            Ok(Credential {
                identity: identity.to_string(),
                secret: secret.to_string(),
            })
        }
        _ => Err(AuthError::MalformedCredential),
    }
}

/// Encodes a name/secret pair the way clients are expected to.
pub fn encode_credential(identity: &str, secret: &str) -> String {
    STANDARD.encode(format!("{identity}:{secret}"))
}

/// Validates credential tokens against the account store.
///
/// Nothing is cached: every call reads the store, so a password change or a
/// deleted account takes effect on the next request.
#[derive(Clone)]
pub struct Authorizer {
    store: Arc<dyn AccountStore>,
}

impl Authorizer {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    pub async fn authorize(&self, token: &str) -> Result<Principal, AuthError> {
        let credential = match decode_credential(token) {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, "rejected credential");
                return Err(e);
            }
        };
        self.verify(&credential.identity, &credential.secret).await
    }

    /// Checks a plain name/secret pair, as used by login.
    pub async fn verify(&self, name: &str, secret: &str) -> Result<Principal, AuthError> {
        match self.store.find_by_name(name).await? {
            Some(account) if account.password == secret => {
                tracing::debug!(identity = %name, "credential accepted");
                Ok(Principal(account.name))
            }
            _ => {
                tracing::warn!(identity = %name, "credential does not match any account");
                Err(AuthError::InvalidCredential)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{create_sqlite_account_store, Account};

    #[test]
    fn empty_token_is_missing() {
        assert!(matches!(
            decode_credential(""),
            Err(AuthError::MissingCredential)
        ));
    }

    #[test]
    fn decodes_two_field_payload() {
        let token = encode_credential("alice", "secret1");
        assert_eq!(token, "YWxpY2U6c2VjcmV0MQ==");
        assert_eq!(
            decode_credential(&token).unwrap(),
            Credential {
                identity: "alice".into(),
                secret: "secret1".into()
            }
        );
    }

    #[test]
    fn malformed_tokens() {
        let cases = [
            "not base64 at all!".to_string(),
            "YWxpY2U6c2VjcmV0MQ".to_string(), // missing padding
            STANDARD.encode("alice"),
            STANDARD.encode("alice:"),
            STANDARD.encode(":secret"),
            STANDARD.encode(":"),
            STANDARD.encode("alice:secret:extra"),
            STANDARD.encode([0xff, 0xfe, b':', b'x']),
        ];
        for token in cases {
            assert!(
                matches!(decode_credential(&token), Err(AuthError::MalformedCredential)),
                "{token} should be malformed"
            );
        }
    }

    async fn authorizer_with_alice() -> Authorizer {
        let store = create_sqlite_account_store("sqlite::memory:").await.unwrap();
        store
            .insert(&Account::new("alice", "secret1", "alice-room", 0))
            .await
            .unwrap();
        Authorizer::new(Arc::new(store))
    }

    #[actix_web::test]
    async fn authorize_known_account() {
        let authorizer = authorizer_with_alice().await;
        let principal = authorizer
            .authorize(&encode_credential("alice", "secret1"))
            .await
            .unwrap();
        assert_eq!(principal.name(), "alice");
        assert!(principal.is("alice"));
    }

    #[actix_web::test]
    async fn wrong_secret_or_unknown_name_is_invalid() {
        let authorizer = authorizer_with_alice().await;
        for token in [
            encode_credential("alice", "wrong"),
            encode_credential("bob", "secret1"),
        ] {
            assert!(matches!(
                authorizer.authorize(&token).await,
                Err(AuthError::InvalidCredential)
            ));
        }
    }

    #[actix_web::test]
    async fn empty_token_never_reaches_the_store() {
        let authorizer = authorizer_with_alice().await;
        assert!(matches!(
            authorizer.authorize("").await,
            Err(AuthError::MissingCredential)
        ));
    }
}
