//! Authentication Extractors
//!
//! Header parsing for bearer tokens and API keys, and the axum extractor
//! for authenticated users.

use crate::error::{AuthError, ExtractError};
use crate::service::AuthService;

use axum::{
    async_trait,
    extract::{FromRef, FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::sync::Arc;
use uuid::Uuid;

const BEARER_PREFIX: &str = "Bearer ";
const API_KEY_PREFIX: &str = "ApiKey ";

fn credential<'a>(headers: &'a HeaderMap, prefix: &str) -> Result<&'a str, ExtractError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(ExtractError::MissingHeader)?
        .to_str()
        .map_err(|_| ExtractError::MalformedHeader)?;

    let credential = value
        .strip_prefix(prefix)
        .ok_or(ExtractError::MalformedHeader)?;

    if credential.is_empty() || credential.contains(char::is_whitespace) {
        return Err(ExtractError::MalformedHeader);
    }

    Ok(credential)
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ExtractError> {
    credential(headers, BEARER_PREFIX)
}

/// Key from an `Authorization: ApiKey <key>` header
pub fn api_key(headers: &HeaderMap) -> Result<&str, ExtractError> {
    credential(headers, API_KEY_PREFIX)
}

/// Compare a presented API key with the configured one without
/// short-circuiting on the first differing byte
pub fn api_key_matches(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// JSON request body whose rejections use the auth error format
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AuthError))]
pub struct JsonBody<T>(pub T);

/// Authenticated user id, taken from a validated session token.
///
/// Reuses the id stored by [`crate::middleware::require_auth`] when the
/// route sits behind it, otherwise validates the bearer token itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let auth = Arc::<AuthService>::from_ref(state);
        let user_id = auth.authorize(&parts.headers)?;

        Ok(AuthUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            bearer_token(&HeaderMap::new()),
            Err(ExtractError::MissingHeader)
        );
        assert_eq!(api_key(&HeaderMap::new()), Err(ExtractError::MissingHeader));
    }

    #[test]
    fn test_empty_bearer_token_is_malformed() {
        assert_eq!(
            bearer_token(&headers("Bearer ")),
            Err(ExtractError::MalformedHeader)
        );
        assert_eq!(
            bearer_token(&headers("Bearer    ")),
            Err(ExtractError::MalformedHeader)
        );
    }

    #[test]
    fn test_wrong_scheme_is_malformed() {
        assert_eq!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(ExtractError::MalformedHeader)
        );
        assert_eq!(
            bearer_token(&headers("bearer abc")),
            Err(ExtractError::MalformedHeader)
        );
        assert_eq!(
            bearer_token(&headers("ApiKey abc")),
            Err(ExtractError::MalformedHeader)
        );
        assert_eq!(
            bearer_token(&headers("Bearer abc def")),
            Err(ExtractError::MalformedHeader)
        );
        assert_eq!(
            bearer_token(&headers("Bearer  abc")),
            Err(ExtractError::MalformedHeader)
        );
        assert_eq!(
            bearer_token(&headers("Bearer abc ")),
            Err(ExtractError::MalformedHeader)
        );
    }

    #[test]
    fn test_api_key_extracted() {
        assert_eq!(api_key(&headers("ApiKey f271c81ff7084ee5")), Ok("f271c81ff7084ee5"));
        assert_eq!(
            api_key(&headers("Bearer f271c81ff7084ee5")),
            Err(ExtractError::MalformedHeader)
        );
        assert_eq!(api_key(&headers("ApiKey ")), Err(ExtractError::MalformedHeader));
    }

    #[test]
    fn test_api_key_matches() {
        assert!(api_key_matches("secret", "secret"));
        assert!(!api_key_matches("secreT", "secret"));
        assert!(!api_key_matches("secret1", "secret"));
        assert!(!api_key_matches("", "secret"));
    }
}
