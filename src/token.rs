//! Session token (JWT) issuance and validation.
//!
//! Session tokens are HS256-signed and carry only the registered claims
//! `iss`, `iat`, `exp` and `sub`. Nothing is persisted: a token is valid as
//! long as its signature checks out and `exp` lies in the future.

use crate::config::AuthConfig;
use crate::error::TokenError;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for session tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Issuer
    pub iss: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Subject (user ID)
    pub sub: String,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("JWT error: {:?}", err);
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::MalformedToken,
        }
    }
}

fn validation(issuer: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.leeway = 0;
    validation
}

/// Sign a session token for `subject` that expires `ttl` from now
pub fn issue(
    subject: Uuid,
    signing_key: &[u8],
    issuer: &str,
    ttl: Duration,
) -> Result<String, TokenError> {
    issue_with_key(subject, &EncodingKey::from_secret(signing_key), issuer, ttl)
}

/// Verify a session token and return its subject
pub fn validate(token: &str, signing_key: &[u8], issuer: &str) -> Result<Uuid, TokenError> {
    validate_with_key(token, &DecodingKey::from_secret(signing_key), issuer)
}

fn issue_with_key(
    subject: Uuid,
    key: &EncodingKey,
    issuer: &str,
    ttl: Duration,
) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = SessionClaims {
        iss: issuer.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        sub: subject.to_string(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, key)
        .map_err(|e| TokenError::Signing(e.to_string()))
}

fn decode_claims(token: &str, key: &DecodingKey, issuer: &str) -> Result<SessionClaims, TokenError> {
    let claims = decode::<SessionClaims>(token, key, &validation(issuer))?.claims;

    // jsonwebtoken accepts exp == now; a token must expire strictly after now
    if claims.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

fn validate_with_key(token: &str, key: &DecodingKey, issuer: &str) -> Result<Uuid, TokenError> {
    let claims = decode_claims(token, key, issuer)?;
    Uuid::parse_str(&claims.sub).map_err(|_| TokenError::MalformedSubject)
}

/// Issues and validates session tokens with keys derived once at startup
pub struct TokenIssuer {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenIssuer {
    pub fn new(signing_key: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.jwt_issuer.clone())
    }

    pub fn issue(&self, subject: Uuid, ttl: Duration) -> Result<String, TokenError> {
        issue_with_key(subject, &self.encoding_key, &self.issuer, ttl)
    }

    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        validate_with_key(token, &self.decoding_key, &self.issuer)
    }

    /// Verify a token and return its full claim set
    pub fn claims(&self, token: &str) -> Result<SessionClaims, TokenError> {
        decode_claims(token, &self.decoding_key, &self.issuer)
    }
}
