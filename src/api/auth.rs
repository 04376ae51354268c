//! Request authentication.
//!
//! Sessions are terminated by an upstream auth proxy which forwards the
//! signed-in identity as `x-user-*` headers. The cron trigger instead uses a
//! shared bearer secret.

use super::AppState;
use crate::{
    core::user::{Identity, get_user_by_email},
    entities::user,
    errors::{Error, Result},
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use sha2::{Digest, Sha256};

/// Header carrying the signed-in e-mail address.
pub const EMAIL_HEADER: &str = "x-user-email";
/// Header carrying the display name.
pub const NAME_HEADER: &str = "x-user-name";
/// Header carrying the avatar URL.
pub const IMAGE_HEADER: &str = "x-user-image";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// The identity asserted by the auth proxy. Rejects with 401 when absent.
#[derive(Debug, Clone)]
pub struct AuthIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let email = header_value(&parts.headers, EMAIL_HEADER).ok_or(Error::Unauthenticated)?;
        Ok(Self(Identity {
            email,
            name: header_value(&parts.headers, NAME_HEADER),
            image: header_value(&parts.headers, IMAGE_HEADER),
        }))
    }
}

/// The stored user for the asserted identity. 401 without identity, 404 when
/// the user never signed in.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let AuthIdentity(identity) = AuthIdentity::from_request_parts(parts, state).await?;
        get_user_by_email(&state.db, &identity.email).await.map(Self)
    }
}

/// Checks `Authorization: Bearer <secret>`. Without a configured secret every
/// call is refused.
pub fn verify_cron_secret(headers: &HeaderMap, secret: Option<&str>) -> Result<()> {
    let Some(secret) = secret else {
        return Err(Error::Unauthenticated);
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if secrets_match(token, secret) => Ok(()),
        _ => Err(Error::Unauthenticated),
    }
}

/// Compares fixed-length digests without an early exit.
fn secrets_match(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(header::AUTHORIZATION, value);
        }
        headers
    }

    #[test]
    fn test_cron_secret_must_match() {
        assert!(verify_cron_secret(&bearer("s3cret"), Some("s3cret")).is_ok());
        assert!(matches!(
            verify_cron_secret(&bearer("wrong"), Some("s3cret")),
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(
            verify_cron_secret(&HeaderMap::new(), Some("s3cret")),
            Err(Error::Unauthenticated)
        ));
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("s3cret", "s3cret"));
        assert!(!secrets_match("s3cre", "s3cret"));
        assert!(!secrets_match("s3cret ", "s3cret"));
        assert!(!secrets_match("", "s3cret"));
    }

    #[test]
    fn test_cron_refused_without_configured_secret() {
        assert!(matches!(
            verify_cron_secret(&bearer(""), None),
            Err(Error::Unauthenticated)
        ));
    }

    #[test]
    fn test_blank_identity_headers_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(NAME_HEADER, HeaderValue::from_static("  "));
        headers.insert(EMAIL_HEADER, HeaderValue::from_static(" a@example.com "));

        assert_eq!(header_value(&headers, NAME_HEADER), None);
        assert_eq!(header_value(&headers, EMAIL_HEADER).as_deref(), Some("a@example.com"));
    }
}
